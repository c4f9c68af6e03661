//! UpdateEngine implementation
//!
//! Coordinates the project config, the content source, snapshots and the
//! update log for the check / diff / apply / rollback cycle.

use std::path::Path;

use arche_fs::{
    FileStatus, ProjectLayout, TRACKED_FILES, classify, fingerprint, io, validate_relative_path,
};
use arche_source::ContentSource;
use chrono::{Local, NaiveDate, NaiveDateTime};
use similar::{ChangeTag, TextDiff};
use tracing::{debug, info, warn};

use crate::backup::{BackupManager, SnapshotId};
use crate::config::{ConfigStore, ProjectConfig, UpdateStrategy};
use crate::history::{UpdateLog, UpdateLogEntry};
use crate::lock::ProjectLock;
use crate::{Error, Result};

use super::policy;
use super::report::{
    ApplyReport, CheckOutcome, DiffEntry, DiffReport, PendingUpdate, RemoteFile, RollbackReport,
    RunOutcome, StatusReport,
};

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Engine for keeping a project's tracked files in line with its source
///
/// Every operation takes the project root explicitly; nothing depends on the
/// process working directory. The content source is passed per call so
/// offline operations (rollback, strategy changes, status) never need one.
pub struct UpdateEngine {
    layout: ProjectLayout,
    store: ConfigStore,
    backups: BackupManager,
    log: UpdateLog,
    clock: fn() -> NaiveDateTime,
}

impl UpdateEngine {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let layout = ProjectLayout::new(root);
        Self {
            store: ConfigStore::new(&layout),
            backups: BackupManager::new(layout.clone()),
            log: UpdateLog::new(&layout),
            layout,
            clock: local_now,
        }
    }

    /// Replace the wall clock used for snapshot ids, log lines and check dates.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    pub fn history(&self) -> &UpdateLog {
        &self.log
    }

    /// Load the project config.
    ///
    /// # Errors
    ///
    /// [`Error::ConfigNotFound`] if the project was never bootstrapped.
    pub fn config(&self) -> Result<ProjectConfig> {
        self.store.load()
    }

    fn today(&self) -> NaiveDate {
        (self.clock)().date()
    }

    /// Compare the tracked files with the source.
    ///
    /// # Errors
    ///
    /// [`Error::NetworkUnavailable`] when the source cannot be reached; the
    /// caller should treat that as "status unknown".
    pub fn check(&self, source: &dyn ContentSource) -> Result<CheckOutcome> {
        let config = self.store.load()?;
        self.check_config(&config, source)
    }

    fn check_config(
        &self,
        config: &ProjectConfig,
        source: &dyn ContentSource,
    ) -> Result<CheckOutcome> {
        if config.is_frozen() {
            debug!(revision = %config.pinned_revision(), "frozen; skipping source");
            return Ok(CheckOutcome::Frozen {
                revision: config.pinned_revision().to_string(),
            });
        }

        let latest = source.latest_revision(&config.branch)?;
        if latest == config.revision {
            debug!(revision = %latest, "revision unchanged");
            return Ok(CheckOutcome::UpToDate { revision: latest });
        }

        let remote = self.fetch_tracked(config, source)?;
        if remote.is_empty() {
            warn!(mode = %config.mode, branch = %config.branch, "no tracked files found at source");
            return Ok(CheckOutcome::UpToDate { revision: latest });
        }

        let files: Vec<RemoteFile> = remote
            .into_iter()
            .filter(|(file, _)| file.status.needs_update())
            .map(|(file, _)| file)
            .collect();
        if files.is_empty() {
            debug!(revision = %latest, "revision moved but tracked files match");
            return Ok(CheckOutcome::UpToDate { revision: latest });
        }

        info!(
            current = %config.revision,
            latest = %latest,
            files = files.len(),
            "updates available"
        );
        Ok(CheckOutcome::UpdatesAvailable(PendingUpdate {
            current: config.revision.clone(),
            revision: latest,
            files,
        }))
    }

    /// Fetch every tracked file the source has for the mode, paired with the
    /// local bytes when present.
    fn fetch_tracked(
        &self,
        config: &ProjectConfig,
        source: &dyn ContentSource,
    ) -> Result<Vec<(RemoteFile, Option<Vec<u8>>)>> {
        let mut files = Vec::with_capacity(TRACKED_FILES.len());
        for name in TRACKED_FILES {
            let Some(content) = source.fetch_shared(&config.mode, name, &config.branch)? else {
                debug!(file = %name, mode = %config.mode, "not present at source");
                continue;
            };
            let local = io::read_optional(&self.layout.file(name))?;
            let local_fingerprint = local.as_deref().map(fingerprint);
            let status = classify(local_fingerprint.as_ref(), &fingerprint(&content));
            debug!(file = %name, status = %status, "classified");

            files.push((
                RemoteFile {
                    name: name.to_string(),
                    content,
                    status,
                },
                local,
            ));
        }
        Ok(files)
    }

    /// Report per-file status and line counts without changing anything.
    pub fn diff(&self, source: &dyn ContentSource) -> Result<DiffReport> {
        let config = self.store.load()?;
        if config.is_frozen() {
            return Ok(DiffReport::frozen());
        }

        let revision = source.latest_revision(&config.branch)?;
        let entries = self
            .fetch_tracked(&config, source)?
            .into_iter()
            .map(|(remote, local)| diff_entry(&remote, local.as_deref()))
            .collect();

        Ok(DiffReport {
            frozen: false,
            revision: Some(revision),
            entries,
        })
    }

    /// Write the pending files, after snapshotting the full tracked set.
    ///
    /// An empty update is a no-op: no snapshot, no config change.
    ///
    /// # Errors
    ///
    /// - [`Error::Locked`] if another process is updating the project
    /// - [`Error::PartialWriteFailure`] if some writes failed after the
    ///   snapshot was taken; files already written stay written
    pub fn apply(&self, update: &PendingUpdate) -> Result<ApplyReport> {
        if update.is_empty() {
            debug!("nothing to apply");
            return Ok(ApplyReport {
                snapshot: None,
                written: Vec::new(),
                revision: update.current.clone(),
            });
        }

        let _lock = ProjectLock::acquire(&self.layout)?;
        let mut config = self.store.load()?;
        let now = (self.clock)();

        let snapshot = self
            .backups
            .create_snapshot_at(TRACKED_FILES, Some(&config.revision), now)?;

        let mut written = Vec::new();
        let mut failed = Vec::new();
        for file in &update.files {
            let result = validate_relative_path(&file.name)
                .and_then(|()| io::write_atomic(&self.layout.file(&file.name), &file.content));
            match result {
                Ok(()) => {
                    debug!(file = %file.name, "updated");
                    written.push(file.name.clone());
                }
                Err(e) => {
                    warn!(file = %file.name, error = %e, "write failed");
                    failed.push((file.name.clone(), e.to_string()));
                }
            }
        }

        if !failed.is_empty() {
            return Err(Error::PartialWriteFailure {
                snapshot: snapshot.to_string(),
                written,
                failed,
            });
        }

        config.revision = update.revision.clone();
        config.last_check = Some(now.date());
        self.store.save(&config)?;
        self.log
            .append(&UpdateLogEntry::new(now, &update.revision, written.len()))?;

        info!(
            revision = %update.revision,
            files = written.len(),
            snapshot = %snapshot,
            "applied update"
        );
        Ok(ApplyReport {
            snapshot: Some(snapshot),
            written,
            revision: update.revision.clone(),
        })
    }

    /// Restore a snapshot. Does not contact the source.
    ///
    /// # Errors
    ///
    /// [`Error::SnapshotNotFound`] when `id` is malformed or names no snapshot.
    pub fn rollback(&self, id: &str) -> Result<RollbackReport> {
        let id = SnapshotId::parse(id)?;
        if !self.backups.exists(&id) {
            return Err(Error::SnapshotNotFound { id: id.to_string() });
        }

        let _lock = ProjectLock::acquire(&self.layout)?;
        let restored = self.backups.restore(&id)?;
        Ok(RollbackReport { id, restored })
    }

    /// Delete all but the newest `keep` snapshots.
    pub fn prune_backups(&self, keep: usize) -> Result<Vec<SnapshotId>> {
        let _lock = ProjectLock::acquire(&self.layout)?;
        self.backups.prune(keep)
    }

    /// Change the update strategy.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidStrategy`] or [`Error::InvalidInterval`], in both
    /// cases without modifying the config.
    pub fn set_strategy(&self, value: &str, interval: Option<u32>) -> Result<ProjectConfig> {
        let strategy: UpdateStrategy = value.parse()?;
        let mut config = self.store.load()?;
        policy::apply_strategy(&mut config, strategy, interval)?;
        self.store.save(&config)?;

        info!(strategy = %strategy, interval = ?config.check_interval_days, "strategy changed");
        Ok(config)
    }

    /// Freeze the project at `version`.
    pub fn pin(&self, version: &str) -> Result<ProjectConfig> {
        let mut config = self.store.load()?;
        policy::pin(&mut config, version);
        self.store.save(&config)?;

        info!(version, "pinned");
        Ok(config)
    }

    /// Whether a `prompt` project is due for a check today.
    pub fn should_prompt(&self) -> Result<bool> {
        Ok(policy::should_prompt(&self.store.load()?, self.today()))
    }

    pub fn status(&self) -> Result<StatusReport> {
        let config = self.store.load()?;
        let today = self.today();

        Ok(StatusReport {
            prompt_due: policy::should_prompt(&config, today),
            next_check: policy::next_check(&config),
            last_update: self.log.last()?,
            snapshots: self.backups.list_snapshots()?.len(),
            strategy: config.strategy,
            mode: config.mode,
            form: config.form,
            revision: config.revision,
            branch: config.branch,
            frozen_revision: config.frozen_revision,
            check_interval_days: config.check_interval_days,
            last_check: config.last_check,
        })
    }

    /// Run the configured strategy.
    ///
    /// - `frozen`: nothing, regardless of `apply_requested`
    /// - `auto`, or any strategy with `apply_requested`: check, then apply
    /// - `manual`: check and hand back pending updates
    /// - `prompt`: only when due; records today's date, checks and hands back
    ///   pending updates for the caller to confirm
    pub fn run(&self, source: &dyn ContentSource, apply_requested: bool) -> Result<RunOutcome> {
        let mut config = self.store.load()?;
        if config.is_frozen() {
            return Ok(RunOutcome::Frozen {
                revision: config.pinned_revision().to_string(),
            });
        }

        if config.strategy == UpdateStrategy::Prompt && !apply_requested {
            let today = self.today();
            if !policy::should_prompt(&config, today) {
                debug!(last_check = ?config.last_check, "prompt not due");
                return Ok(RunOutcome::NotDue {
                    next_check: policy::next_check(&config),
                });
            }
            config.last_check = Some(today);
            self.store.save(&config)?;
        }

        let pending = match self.check_config(&config, source)? {
            CheckOutcome::UpdatesAvailable(pending) => pending,
            CheckOutcome::UpToDate { revision } => return Ok(RunOutcome::UpToDate { revision }),
            CheckOutcome::Frozen { revision } => return Ok(RunOutcome::Frozen { revision }),
        };

        if apply_requested || config.strategy == UpdateStrategy::Auto {
            Ok(RunOutcome::Applied(self.apply(&pending)?))
        } else {
            Ok(RunOutcome::Pending(pending))
        }
    }
}

fn count_lines(content: &str) -> usize {
    content.lines().count()
}

fn diff_entry(remote: &RemoteFile, local: Option<&[u8]>) -> DiffEntry {
    let new = String::from_utf8_lossy(&remote.content);
    let old = local.map(String::from_utf8_lossy);

    let (inserted, deleted) = match (&old, remote.status) {
        (_, FileStatus::Unchanged) => (0, 0),
        (None, _) => (count_lines(&new), 0),
        (Some(old), _) => {
            let diff = TextDiff::from_lines(&**old, &*new);
            diff.iter_all_changes()
                .fold((0, 0), |(ins, del), change| match change.tag() {
                    ChangeTag::Insert => (ins + 1, del),
                    ChangeTag::Delete => (ins, del + 1),
                    ChangeTag::Equal => (ins, del),
                })
        }
    };

    DiffEntry {
        file: remote.name.clone(),
        status: remote.status,
        local_lines: old.as_deref().map(count_lines),
        remote_lines: count_lines(&new),
        inserted,
        deleted,
    }
}
