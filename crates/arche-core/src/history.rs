//! Append-only update log
//!
//! Each successful apply adds one line to `.arche-update.log`:
//!
//! ```text
//! [2026-10-14T09:30:12] Updated to def5678 - 2 files
//! ```

use arche_fs::{NormalizedPath, ProjectLayout, io};
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use crate::Result;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One applied update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateLogEntry {
    pub timestamp: NaiveDateTime,
    pub revision: String,
    pub file_count: usize,
}

impl UpdateLogEntry {
    pub fn new(timestamp: NaiveDateTime, revision: impl Into<String>, file_count: usize) -> Self {
        Self {
            timestamp,
            revision: revision.into(),
            file_count,
        }
    }

    /// Render the entry as a log line (without trailing newline).
    pub fn to_line(&self) -> String {
        format!(
            "[{}] Updated to {} - {} files",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.revision,
            self.file_count
        )
    }

    /// Parse a log line back into an entry.
    pub fn parse_line(line: &str) -> Option<Self> {
        let rest = line.trim_end().strip_prefix('[')?;
        let (timestamp, rest) = rest.split_once("] Updated to ")?;
        let (revision, count) = rest.rsplit_once(" - ")?;
        let file_count = count.strip_suffix(" files")?.parse().ok()?;
        let timestamp = timestamp.parse::<NaiveDateTime>().ok()?;

        Some(Self {
            timestamp,
            revision: revision.to_string(),
            file_count,
        })
    }
}

/// The project's `.arche-update.log`
#[derive(Debug, Clone)]
pub struct UpdateLog {
    path: NormalizedPath,
}

impl UpdateLog {
    pub fn new(layout: &ProjectLayout) -> Self {
        Self {
            path: layout.update_log_path(),
        }
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    pub fn append(&self, entry: &UpdateLogEntry) -> Result<()> {
        io::append_line(&self.path, &entry.to_line())?;
        debug!(revision = %entry.revision, files = entry.file_count, "appended update log entry");
        Ok(())
    }

    /// All parseable entries, oldest first. Malformed lines are skipped.
    pub fn entries(&self) -> Result<Vec<UpdateLogEntry>> {
        let Some(content) = io::read_optional(&self.path)? else {
            return Ok(Vec::new());
        };
        Ok(String::from_utf8_lossy(&content)
            .lines()
            .filter_map(UpdateLogEntry::parse_line)
            .collect())
    }

    pub fn last(&self) -> Result<Option<UpdateLogEntry>> {
        Ok(self.entries()?.pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 14)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn line_format() {
        let entry = UpdateLogEntry::new(at(9, 30, 12), "def5678", 2);
        assert_eq!(entry.to_line(), "[2026-10-14T09:30:12] Updated to def5678 - 2 files");
        assert_eq!(UpdateLogEntry::parse_line(&entry.to_line()), Some(entry));
    }

    #[test]
    fn parses_fractional_seconds() {
        let entry =
            UpdateLogEntry::parse_line("[2026-10-14T09:30:12.482913] Updated to abc1234 - 3 files")
                .unwrap();
        assert_eq!(entry.revision, "abc1234");
        assert_eq!(entry.file_count, 3);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(".arche-update.log"),
            concat!(
                "garbage\n",
                "[2026-10-14T09:30:12] Updated to abc1234 - 1 files\n",
                "[bad] Updated to x - y files\n",
            ),
        )
        .unwrap();
        let log = UpdateLog::new(&ProjectLayout::new(temp.path()));

        let entries = log.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].revision, "abc1234");
    }

    #[test]
    fn append_keeps_order() {
        let temp = TempDir::new().unwrap();
        let log = UpdateLog::new(&ProjectLayout::new(temp.path()));
        assert_eq!(log.last().unwrap(), None);

        log.append(&UpdateLogEntry::new(at(8, 0, 0), "abc1234", 1)).unwrap();
        log.append(&UpdateLogEntry::new(at(9, 0, 0), "def5678", 3)).unwrap();

        let entries = log.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(log.last().unwrap().unwrap().revision, "def5678");
    }
}
