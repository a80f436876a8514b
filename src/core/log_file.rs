// BeerTally - GPL-3.0-or-later
// This file is part of BeerTally.
//
// Copyright (C) 2025 Daniel Freiermuth
//
// BeerTally is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// BeerTally is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with BeerTally.  If not, see <https://www.gnu.org/licenses/>.

//! Reading chat exports from disk.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

/// File name prefix of exported group chats
pub const DEFAULT_EXPORT_PREFIX: &str = "WhatsApp Chat with";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no chat export found at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SourceError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Read an export into lines.
///
/// Invalid UTF-8 is replaced rather than rejected; exports occasionally carry
/// truncated emoji.
pub fn load_chat_lines(path: &Path) -> Result<Vec<String>, SourceError> {
    let start_time = std::time::Instant::now();

    let mut file = File::open(path).map_err(|e| SourceError::io(path, e))?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)
        .map_err(|e| SourceError::io(path, e))?;

    let content = String::from_utf8_lossy(&buffer);
    // Some exports start with a byte order mark
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    let lines: Vec<String> = content.lines().map(str::to_string).collect();

    tracing::info!(
        "Read {} lines ({} bytes) from {} in {:?}",
        lines.len(),
        buffer.len(),
        path.display(),
        start_time.elapsed()
    );

    Ok(lines)
}

/// Most recently modified file in `dir` whose name starts with `prefix`
pub fn find_latest_export(dir: &Path, prefix: &str) -> Result<PathBuf, SourceError> {
    let entries = fs::read_dir(dir).map_err(|e| SourceError::io(dir, e))?;

    let mut latest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries {
        let entry = entry.map_err(|e| SourceError::io(dir, e))?;
        let path = entry.path();

        let matches_prefix = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(prefix));
        if !matches_prefix || !path.is_file() {
            continue;
        }

        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .map_err(|e| SourceError::io(&path, e))?;
        tracing::trace!("Export candidate {} modified {modified:?}", path.display());

        if latest.as_ref().map_or(true, |(best, _)| modified > *best) {
            latest = Some((modified, path));
        }
    }

    match latest {
        Some((_, path)) => {
            tracing::info!("Using most recent export {}", path.display());
            Ok(path)
        }
        None => Err(SourceError::NotFound {
            path: dir.join(format!("{prefix}*")),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_load_lines_lossy() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("chat.txt");
        let mut file = File::create(&path).expect("create file");
        file.write_all(b"\xEF\xBB\xBF14/06/2025, 17:43 - A: 1\r\n14/06/2025, 17:44 - B: \xFF2\n")
            .expect("write file");

        let lines = load_chat_lines(&path).expect("should load");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "14/06/2025, 17:43 - A: 1");
        assert!(lines[1].ends_with("\u{fffd}2"));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_chat_lines(&dir.path().join("nope.txt")).expect_err("should fail");
        assert!(matches!(err, SourceError::NotFound { .. }));
    }

    #[test]
    fn test_find_latest_export() {
        let dir = tempfile::tempdir().expect("tempdir");
        let older = dir.path().join("WhatsApp Chat with Tally (1).txt");
        let newer = dir.path().join("WhatsApp Chat with Tally (2).txt");
        let other = dir.path().join("notes.txt");

        fs::write(&older, "a").expect("write");
        fs::write(&newer, "b").expect("write");
        fs::write(&other, "c").expect("write");

        let base = SystemTime::now();
        File::options()
            .write(true)
            .open(&older)
            .and_then(|f| f.set_modified(base - Duration::from_secs(3600)))
            .expect("set mtime");
        File::options()
            .write(true)
            .open(&other)
            .and_then(|f| f.set_modified(base + Duration::from_secs(3600)))
            .expect("set mtime");

        let found = find_latest_export(dir.path(), DEFAULT_EXPORT_PREFIX).expect("should find");
        assert_eq!(found, newer);
    }

    #[test]
    fn test_find_latest_export_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("notes.txt"), "c").expect("write");
        let err = find_latest_export(dir.path(), DEFAULT_EXPORT_PREFIX).expect_err("should fail");
        assert!(matches!(err, SourceError::NotFound { .. }));
    }
}
