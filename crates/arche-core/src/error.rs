//! Error types for arche-core

use std::path::PathBuf;

/// Result type for arche-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in arche-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No `.arche-config` at the project root
    #[error(".arche-config not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// `.arche-config` exists but does not parse
    #[error("Invalid .arche-config at {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    /// The template source could not be reached
    #[error("Unable to reach the template source: {reason}")]
    NetworkUnavailable { reason: String },

    #[error("Invalid strategy: {value} (valid options: auto, frozen, manual, prompt)")]
    InvalidStrategy { value: String },

    #[error("Invalid check interval: {days} (must be a positive number of days)")]
    InvalidInterval { days: u32 },

    #[error("Backup not found: {id}")]
    SnapshotNotFound { id: String },

    /// Some files were written after the backup was taken, some were not
    #[error(
        "Update partially applied (backup {snapshot}); written: {}; failed: {}",
        list_or_none(.written),
        failures(.failed)
    )]
    PartialWriteFailure {
        snapshot: String,
        written: Vec<String>,
        failed: Vec<(String, String)>,
    },

    /// Another process holds the project lock
    #[error("Project is locked by another arche process ({path})")]
    Locked { path: PathBuf },

    #[error("Project already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("Form '{form}' in mode '{mode}' not found or invalid")]
    TemplateNotFound { mode: String, form: String },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from arche-fs
    #[error(transparent)]
    Fs(#[from] arche_fs::Error),

    /// Content error from arche-source other than unavailability
    #[error(transparent)]
    Source(arche_source::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error
    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),
}

fn list_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

fn failures(failed: &[(String, String)]) -> String {
    let described: Vec<String> = failed
        .iter()
        .map(|(file, reason)| format!("{file} ({reason})"))
        .collect();
    list_or_none(&described)
}

impl From<arche_source::Error> for Error {
    fn from(err: arche_source::Error) -> Self {
        if err.is_unavailable() {
            Self::NetworkUnavailable {
                reason: err.to_string(),
            }
        } else {
            Self::Source(err)
        }
    }
}

impl Error {
    /// The next step a user should take after this error, if there is one.
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::ConfigNotFound { .. } => {
                Some("Are you in an arche project? Run `arche init` to bootstrap one.".into())
            }
            Self::ConfigInvalid { .. } => Some(
                "Fix the JSON in .arche-config or restore it with \
                 `arche update --rollback <timestamp>`."
                    .into(),
            ),
            Self::NetworkUnavailable { .. } => Some(
                "Could not determine update status; check the --source path and try again."
                    .into(),
            ),
            Self::InvalidStrategy { .. } => {
                Some("Use one of: auto, frozen, manual, prompt.".into())
            }
            Self::InvalidInterval { .. } => {
                Some("Pass --interval with a value of 1 or more.".into())
            }
            Self::SnapshotNotFound { .. } => {
                Some("Run `arche update --list-backups` to see available timestamps.".into())
            }
            Self::PartialWriteFailure { snapshot, .. } => Some(format!(
                "Use `arche update --rollback {snapshot}` to restore the previous files."
            )),
            Self::Locked { .. } => {
                Some("Wait for the other process to finish, then retry.".into())
            }
            Self::AlreadyInitialized { .. } => {
                Some("Use `arche update` to refresh framework files, or pass --force.".into())
            }
            Self::TemplateNotFound { .. } => {
                Some("Run `arche modes` and `arche forms <mode>` to list templates.".into())
            }
            Self::Fs(arche_fs::Error::Io { path, .. }) => {
                Some(filesystem_hint(&path.display().to_string()))
            }
            Self::Fs(arche_fs::Error::LockFailed { path }) => Some(format!(
                "Another process may be writing {}; wait for it to finish, then retry.",
                path.display()
            )),
            Self::Fs(arche_fs::Error::InvalidPath { .. }) => Some(
                "The template contains an unsafe path; report it to the template maintainers."
                    .into(),
            ),
            Self::Io(_) => Some(filesystem_hint("the project files")),
            Self::Source(_) => {
                Some("Check that --source points at a clone of the template repository.".into())
            }
            Self::Json(_) | Self::TomlDe(_) | Self::TomlSer(_) => Some(
                "Run `arche update --list-backups` and restore a known-good state with \
                 `arche update --rollback <timestamp>`."
                    .into(),
            ),
        }
    }

    /// Whether the caller may continue as if no update were available.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NetworkUnavailable { .. })
    }
}

fn filesystem_hint(what: &str) -> String {
    format!(
        "Check that {what} is a regular file you can read and write. If some files were \
         already updated, `arche update --list-backups` and `--rollback <timestamp>` restore them."
    )
}
