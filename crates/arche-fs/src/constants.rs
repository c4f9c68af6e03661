//! Well-known file and directory names inside an Arche project.

use std::path::Path;

/// Framework files synced from `modes/<mode>/_shared/` and watched for drift.
pub const TRACKED_FILES: &[&str] = &["agents.md", "INSTRUCTIONS.md", "init_env.md"];

/// Standard project-root markers and paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchePath {
    /// The `.arche-config` provenance record
    Config,
    /// The `.arche-backups` directory holding snapshots
    Backups,
    /// The append-only `.arche-update.log`
    UpdateLog,
    /// The `.arche.lock` advisory lock file
    Lock,
    /// The `.arche-telemetry` opt-in record
    Telemetry,
    /// The project's `.gitignore`
    GitIgnore,
    /// Metadata written into every snapshot directory
    SnapshotMetadata,
}

impl ArchePath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Config => ".arche-config",
            Self::Backups => ".arche-backups",
            Self::UpdateLog => ".arche-update.log",
            Self::Lock => ".arche.lock",
            Self::Telemetry => ".arche-telemetry",
            Self::GitIgnore => ".gitignore",
            Self::SnapshotMetadata => "snapshot.toml",
        }
    }
}

impl AsRef<Path> for ArchePath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for ArchePath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for ArchePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
