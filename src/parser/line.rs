use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One chat message recovered from a matching export line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRecord {
    pub timestamp: NaiveDateTime,
    pub sender: String,
    pub message: String,
    /// 1-based position of the source line in the export
    pub line_number: usize,
}

impl ChatRecord {
    pub const fn new(
        timestamp: NaiveDateTime,
        sender: String,
        message: String,
        line_number: usize,
    ) -> Self {
        Self {
            timestamp,
            sender,
            message,
            line_number,
        }
    }
}

/// Order of the day and month fields in the export's date stamp.
///
/// Exports follow the phone's locale, so `14/06/2025` and `6/14/25` both occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    #[default]
    DayFirst,
    MonthFirst,
}

impl DateOrder {
    /// Split the first two date fields into `(day, month)`
    pub const fn day_month(self, first: u32, second: u32) -> (u32, u32) {
        match self {
            Self::DayFirst => (first, second),
            Self::MonthFirst => (second, first),
        }
    }
}
