//! Result types returned by [`UpdateEngine`](super::UpdateEngine)
//!
//! All of them serialize for `--json` output.

use arche_fs::FileStatus;
use chrono::NaiveDate;
use serde::Serialize;

use crate::backup::SnapshotId;
use crate::config::UpdateStrategy;
use crate::history::UpdateLogEntry;

/// A tracked file as fetched from the source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteFile {
    /// Path relative to the project root
    pub name: String,
    #[serde(skip)]
    pub content: Vec<u8>,
    pub status: FileStatus,
}

/// Files that differ from the source at a newer revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingUpdate {
    /// Marker recorded in the project config
    pub current: String,
    /// Marker the source reported
    pub revision: String,
    pub files: Vec<RemoteFile>,
}

impl PendingUpdate {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn file_names(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.name.as_str()).collect()
    }
}

/// Outcome of [`UpdateEngine::check`](super::UpdateEngine::check)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// Strategy is frozen; the source was not contacted
    Frozen { revision: String },
    UpToDate { revision: String },
    UpdatesAvailable(PendingUpdate),
}

impl CheckOutcome {
    pub fn has_updates(&self) -> bool {
        matches!(self, Self::UpdatesAvailable(_))
    }
}

/// Per-file line of a diff report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffEntry {
    pub file: String,
    pub status: FileStatus,
    /// `None` when the file is absent locally
    pub local_lines: Option<usize>,
    pub remote_lines: usize,
    pub inserted: usize,
    pub deleted: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffReport {
    pub frozen: bool,
    /// Marker the source reported; `None` when frozen
    pub revision: Option<String>,
    pub entries: Vec<DiffEntry>,
}

impl DiffReport {
    pub fn frozen() -> Self {
        Self {
            frozen: true,
            revision: None,
            entries: Vec::new(),
        }
    }

    pub fn changed(&self) -> impl Iterator<Item = &DiffEntry> {
        self.entries.iter().filter(|e| e.status.needs_update())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// Snapshot taken before writing; `None` for an empty update
    pub snapshot: Option<SnapshotId>,
    pub written: Vec<String>,
    pub revision: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollbackReport {
    pub id: SnapshotId,
    pub restored: Vec<String>,
}

/// Summary of a project's update state, read from local files only
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub strategy: UpdateStrategy,
    pub mode: String,
    pub form: String,
    pub revision: String,
    pub branch: String,
    pub frozen_revision: Option<String>,
    pub check_interval_days: Option<u32>,
    pub last_check: Option<NaiveDate>,
    pub prompt_due: bool,
    pub next_check: Option<NaiveDate>,
    pub last_update: Option<UpdateLogEntry>,
    pub snapshots: usize,
}

/// Outcome of [`UpdateEngine::run`](super::UpdateEngine::run)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Frozen { revision: String },
    /// `prompt` strategy and the interval has not elapsed
    NotDue { next_check: Option<NaiveDate> },
    UpToDate { revision: String },
    /// Updates found but not applied: `manual`, or `prompt` awaiting confirmation
    Pending(PendingUpdate),
    Applied(ApplyReport),
}
