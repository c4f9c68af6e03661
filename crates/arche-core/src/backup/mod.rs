//! Snapshot backup and restore
//!
//! Before an update overwrites framework files, the current tracked files and
//! `.arche-config` are copied into `.arche-backups/<YYYYMMDD-HHMMSS>/`. The
//! directory name is the snapshot id used for rollback.
//!
//! Each snapshot directory holds:
//! - copies of the tracked files that existed at snapshot time
//! - `.arche-config`, when present
//! - `snapshot.toml`: creation time, revision and captured file list

mod snapshot;

pub use snapshot::{BackupManager, Snapshot, SnapshotId, SnapshotMetadata};
