//! Project-root layout
//!
//! Every operation receives the project root explicitly; this type turns it
//! into the concrete paths of the config, backups, log and tracked files.

use std::path::Path;

use crate::{ArchePath, NormalizedPath};

/// Resolved paths for one project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: NormalizedPath,
}

impl ProjectLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: NormalizedPath::new(root),
        }
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    /// Path of a well-known project file.
    pub fn path(&self, which: ArchePath) -> NormalizedPath {
        self.root.join(which.as_str())
    }

    pub fn config_path(&self) -> NormalizedPath {
        self.path(ArchePath::Config)
    }

    pub fn backups_dir(&self) -> NormalizedPath {
        self.path(ArchePath::Backups)
    }

    /// Directory of the snapshot with the given id.
    pub fn snapshot_dir(&self, id: &str) -> NormalizedPath {
        self.backups_dir().join(id)
    }

    pub fn update_log_path(&self) -> NormalizedPath {
        self.path(ArchePath::UpdateLog)
    }

    pub fn lock_path(&self) -> NormalizedPath {
        self.path(ArchePath::Lock)
    }

    /// A project file addressed relative to the root.
    pub fn file(&self, relative: &str) -> NormalizedPath {
        self.root.join(relative)
    }

    /// Whether the project has been bootstrapped.
    pub fn is_initialized(&self) -> bool {
        self.config_path().is_file()
    }
}
