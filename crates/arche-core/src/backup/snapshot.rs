//! Snapshot implementation
//!
//! Handles creating, listing, restoring and pruning snapshots.

use std::fmt;
use std::fs;
use std::str::FromStr;

use arche_fs::{ArchePath, NormalizedPath, ProjectLayout, io, validate_relative_path};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{Error, Result};

/// Directory-name format of snapshot ids
const ID_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Second-resolution timestamp identifying a snapshot, e.g. `20261014-093012`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(String);

impl SnapshotId {
    pub fn from_time(time: NaiveDateTime) -> Self {
        Self(time.format(ID_FORMAT).to_string())
    }

    /// Parse a user-supplied id.
    ///
    /// # Errors
    ///
    /// Anything that is not a valid timestamp cannot name a snapshot and
    /// yields [`Error::SnapshotNotFound`].
    pub fn parse(value: &str) -> Result<Self> {
        NaiveDateTime::parse_from_str(value, ID_FORMAT)
            .map(Self::from_time)
            .map_err(|_| Error::SnapshotNotFound {
                id: value.to_string(),
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The creation time encoded in the id.
    pub fn created(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.0, ID_FORMAT).ok()
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SnapshotId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Contents of `snapshot.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// When the snapshot was taken
    pub created: NaiveDateTime,
    /// Revision marker recorded in the config at snapshot time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    /// Tracked files captured (relative paths)
    pub files: Vec<String>,
    /// Whether `.arche-config` was captured
    pub config: bool,
}

/// A snapshot on disk
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub path: NormalizedPath,
    /// `None` when `snapshot.toml` is missing or unreadable
    pub metadata: Option<SnapshotMetadata>,
}

/// Manages the snapshots of one project
#[derive(Debug, Clone)]
pub struct BackupManager {
    layout: ProjectLayout,
}

impl BackupManager {
    pub fn new(layout: ProjectLayout) -> Self {
        Self { layout }
    }

    pub fn snapshot_dir(&self, id: &SnapshotId) -> NormalizedPath {
        self.layout.snapshot_dir(id.as_str())
    }

    pub fn exists(&self, id: &SnapshotId) -> bool {
        self.snapshot_dir(id).is_dir()
    }

    /// Snapshot `files` (relative to the project root) and the config under
    /// the id derived from `at`.
    ///
    /// Files that do not exist are skipped. A snapshot taken in the same
    /// second as an existing one replaces it.
    pub fn create_snapshot_at(
        &self,
        files: &[&str],
        revision: Option<&str>,
        at: NaiveDateTime,
    ) -> Result<SnapshotId> {
        let id = SnapshotId::from_time(at);
        let dir = self.snapshot_dir(&id);

        if dir.exists() {
            warn!(snapshot = %id, "replacing snapshot taken in the same second");
            fs::remove_dir_all(dir.as_ref()).map_err(|e| arche_fs::Error::io(dir.to_native(), e))?;
        }
        fs::create_dir_all(dir.as_ref()).map_err(|e| arche_fs::Error::io(dir.to_native(), e))?;

        let mut captured = Vec::new();
        for file in files {
            validate_relative_path(file)?;
            let source = self.layout.file(file);
            if source.is_file() {
                io::copy_file(&source, &dir.join(file))?;
                captured.push(file.to_string());
            }
        }

        let config_source = self.layout.config_path();
        let config = config_source.is_file();
        if config {
            io::copy_file(&config_source, &dir.join(ArchePath::Config.as_str()))?;
        }

        let metadata = SnapshotMetadata {
            created: at,
            revision: revision.map(str::to_string),
            files: captured,
            config,
        };
        let content = toml::to_string_pretty(&metadata)?;
        io::write_atomic(&dir.join(ArchePath::SnapshotMetadata.as_str()), content.as_bytes())?;

        info!(snapshot = %id, files = metadata.files.len(), "created snapshot");
        Ok(id)
    }

    /// Read a snapshot's details.
    pub fn get(&self, id: &SnapshotId) -> Result<Option<Snapshot>> {
        let path = self.snapshot_dir(id);
        if !path.is_dir() {
            return Ok(None);
        }

        let metadata_path = path.join(ArchePath::SnapshotMetadata.as_str());
        let metadata = if metadata_path.is_file() {
            match toml::from_str(&io::read_text(&metadata_path)?) {
                Ok(metadata) => Some(metadata),
                Err(e) => {
                    warn!(snapshot = %id, error = %e, "unreadable snapshot metadata");
                    None
                }
            }
        } else {
            None
        };

        Ok(Some(Snapshot {
            id: id.clone(),
            path,
            metadata,
        }))
    }

    /// Copy every file in the snapshot back into the project.
    ///
    /// Restores the config too when the snapshot holds one. Project files
    /// that are not in the snapshot are left alone.
    ///
    /// # Returns
    /// Restored paths relative to the project root, sorted.
    pub fn restore(&self, id: &SnapshotId) -> Result<Vec<String>> {
        let dir = self.snapshot_dir(id);
        if !dir.is_dir() {
            return Err(Error::SnapshotNotFound {
                id: id.to_string(),
            });
        }

        let mut restored = Vec::new();
        self.restore_dir(&dir, "", &mut restored)?;
        restored.sort();

        info!(snapshot = %id, files = restored.len(), "restored snapshot");
        Ok(restored)
    }

    fn restore_dir(
        &self,
        dir: &NormalizedPath,
        prefix: &str,
        restored: &mut Vec<String>,
    ) -> Result<()> {
        let entries =
            fs::read_dir(dir.as_ref()).map_err(|e| arche_fs::Error::io(dir.to_native(), e))?;
        for entry in entries {
            let entry = entry.map_err(|e| arche_fs::Error::io(dir.to_native(), e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            let relative = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}/{name}")
            };

            if prefix.is_empty() && name == ArchePath::SnapshotMetadata.as_str() {
                continue;
            }
            validate_relative_path(&relative)?;

            let path = entry.path();
            if path.is_dir() {
                self.restore_dir(&dir.join(&name), &relative, restored)?;
            } else if path.is_file() {
                io::copy_file(&dir.join(&name), &self.layout.file(&relative))?;
                debug!(file = %relative, "restored file");
                restored.push(relative);
            }
        }
        Ok(())
    }

    /// All snapshots, newest first.
    pub fn list_snapshots(&self) -> Result<Vec<Snapshot>> {
        let backups_dir = self.layout.backups_dir();
        if !backups_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        let entries = fs::read_dir(backups_dir.as_ref())
            .map_err(|e| arche_fs::Error::io(backups_dir.to_native(), e))?;
        for entry in entries {
            let entry = entry.map_err(|e| arche_fs::Error::io(backups_dir.to_native(), e))?;
            if entry.path().is_dir()
                && let Some(name) = entry.file_name().to_str()
                && let Ok(id) = SnapshotId::parse(name)
            {
                ids.push(id);
            }
        }
        ids.sort_by(|a, b| b.cmp(a));

        let mut snapshots = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(snapshot) = self.get(&id)? {
                snapshots.push(snapshot);
            }
        }
        Ok(snapshots)
    }

    /// Delete all but the newest `keep` snapshots.
    ///
    /// # Returns
    /// Ids of the deleted snapshots, newest first.
    pub fn prune(&self, keep: usize) -> Result<Vec<SnapshotId>> {
        let mut removed = Vec::new();
        for snapshot in self.list_snapshots()?.into_iter().skip(keep) {
            fs::remove_dir_all(snapshot.path.as_ref())
                .map_err(|e| arche_fs::Error::io(snapshot.path.to_native(), e))?;
            removed.push(snapshot.id);
        }
        if !removed.is_empty() {
            info!(removed = removed.len(), keep, "pruned snapshots");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const TRACKED: &[&str] = &["agents.md", "INSTRUCTIONS.md", "init_env.md"];

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 14)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn setup() -> (TempDir, BackupManager) {
        let temp = TempDir::new().unwrap();
        let manager = BackupManager::new(ProjectLayout::new(temp.path()));
        (temp, manager)
    }

    #[test]
    fn snapshot_id_format() {
        let id = SnapshotId::from_time(at(9, 5, 7));
        assert_eq!(id.as_str(), "20261014-090507");
        assert_eq!(SnapshotId::parse("20261014-090507").unwrap(), id);
        assert_eq!(id.created(), Some(at(9, 5, 7)));
    }

    #[test]
    fn snapshot_id_rejects_non_timestamps() {
        for bad in ["latest", "../etc", "2026-10-14", "20261014-250000"] {
            assert!(
                matches!(SnapshotId::parse(bad), Err(Error::SnapshotNotFound { .. })),
                "accepted {bad}"
            );
        }
    }

    #[test]
    fn create_snapshot_captures_present_files_and_config() {
        let (temp, manager) = setup();
        fs::write(temp.path().join("agents.md"), "# Agents").unwrap();
        fs::write(temp.path().join(".arche-config"), "{}").unwrap();

        let id = manager.create_snapshot_at(TRACKED, Some("abc1234"), at(10, 0, 0)).unwrap();

        let dir = temp.path().join(".arche-backups/20261014-100000");
        assert_eq!(fs::read_to_string(dir.join("agents.md")).unwrap(), "# Agents");
        assert!(dir.join(".arche-config").exists());
        assert!(!dir.join("INSTRUCTIONS.md").exists());

        let snapshot = manager.get(&id).unwrap().unwrap();
        let metadata = snapshot.metadata.unwrap();
        assert_eq!(metadata.files, vec!["agents.md".to_string()]);
        assert!(metadata.config);
        assert_eq!(metadata.revision.as_deref(), Some("abc1234"));
    }

    #[test]
    fn same_second_snapshot_replaces_previous() {
        let (temp, manager) = setup();
        fs::write(temp.path().join("agents.md"), "one").unwrap();
        fs::write(temp.path().join("init_env.md"), "env").unwrap();
        manager.create_snapshot_at(TRACKED, None, at(10, 0, 0)).unwrap();

        fs::write(temp.path().join("agents.md"), "two").unwrap();
        fs::remove_file(temp.path().join("init_env.md")).unwrap();
        let id = manager.create_snapshot_at(TRACKED, None, at(10, 0, 0)).unwrap();

        let dir = manager.snapshot_dir(&id).to_native();
        assert_eq!(fs::read_to_string(dir.join("agents.md")).unwrap(), "two");
        assert!(!dir.join("init_env.md").exists());
        assert_eq!(manager.list_snapshots().unwrap().len(), 1);
    }

    #[test]
    fn restore_copies_files_back_and_leaves_others() {
        let (temp, manager) = setup();
        fs::write(temp.path().join("agents.md"), "before").unwrap();
        fs::write(temp.path().join(".arche-config"), r#"{"mode":"3-layer"}"#).unwrap();
        let id = manager.create_snapshot_at(TRACKED, None, at(11, 0, 0)).unwrap();

        fs::write(temp.path().join("agents.md"), "after").unwrap();
        fs::write(temp.path().join(".arche-config"), r#"{"mode":"changed"}"#).unwrap();
        fs::write(temp.path().join("INSTRUCTIONS.md"), "added later").unwrap();

        let restored = manager.restore(&id).unwrap();
        assert_eq!(restored, vec![".arche-config".to_string(), "agents.md".to_string()]);

        assert_eq!(fs::read_to_string(temp.path().join("agents.md")).unwrap(), "before");
        assert!(fs::read_to_string(temp.path().join(".arche-config")).unwrap().contains("3-layer"));
        assert_eq!(
            fs::read_to_string(temp.path().join("INSTRUCTIONS.md")).unwrap(),
            "added later"
        );
        assert!(!temp.path().join("snapshot.toml").exists());
    }

    #[test]
    fn restore_unknown_snapshot() {
        let (_temp, manager) = setup();
        let id = SnapshotId::from_time(at(12, 0, 0));

        assert!(matches!(manager.restore(&id), Err(Error::SnapshotNotFound { .. })));
    }

    #[test]
    fn get_tolerates_missing_or_corrupt_metadata() {
        let (temp, manager) = setup();
        let bare = temp.path().join(".arche-backups/20261014-080000");
        fs::create_dir_all(&bare).unwrap();
        let corrupt = temp.path().join(".arche-backups/20261014-090000");
        fs::create_dir_all(&corrupt).unwrap();
        fs::write(corrupt.join("snapshot.toml"), "files = [").unwrap();

        let bare_id = SnapshotId::parse("20261014-080000").unwrap();
        let corrupt_id = SnapshotId::parse("20261014-090000").unwrap();
        assert!(manager.get(&bare_id).unwrap().unwrap().metadata.is_none());
        assert!(manager.get(&corrupt_id).unwrap().unwrap().metadata.is_none());
    }

    #[test]
    fn list_is_newest_first_and_ignores_foreign_dirs() {
        let (temp, manager) = setup();
        manager.create_snapshot_at(TRACKED, None, at(8, 0, 0)).unwrap();
        manager.create_snapshot_at(TRACKED, None, at(9, 0, 0)).unwrap();
        fs::create_dir_all(temp.path().join(".arche-backups/not-a-snapshot")).unwrap();

        let ids: Vec<String> = manager
            .list_snapshots()
            .unwrap()
            .into_iter()
            .map(|s| s.id.to_string())
            .collect();
        assert_eq!(ids, vec!["20261014-090000", "20261014-080000"]);
    }

    #[test]
    fn prune_keeps_newest() {
        let (_temp, manager) = setup();
        for hour in 6..10 {
            manager.create_snapshot_at(TRACKED, None, at(hour, 0, 0)).unwrap();
        }

        let removed = manager.prune(2).unwrap();
        assert_eq!(
            removed.iter().map(|id| id.to_string()).collect::<Vec<_>>(),
            vec!["20261014-070000", "20261014-060000"]
        );
        assert_eq!(manager.list_snapshots().unwrap().len(), 2);
        assert!(manager.prune(5).unwrap().is_empty());
    }
}
