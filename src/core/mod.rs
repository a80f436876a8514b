pub mod log_file;
pub mod regression;
pub mod session;
pub mod stats;
pub mod table;

pub use log_file::{find_latest_export, load_chat_lines, SourceError};
pub use session::Analysis;
