//! The content source interface and template path conventions
//!
//! Template repositories are laid out as:
//!
//! ```text
//! modes/<mode>/_shared/...            files copied into every project of the mode
//! modes/<mode>/forms/<form>/...       files for one variant
//! modes/<mode>/forms/<form>/project.json
//! ```

use crate::Result;

/// Directory holding the files all forms of a mode share
pub const SHARED_DIR: &str = "_shared";

/// Per-form metadata file, never copied into projects
pub const MANIFEST_FILE: &str = "project.json";

pub fn mode_dir(mode: &str) -> String {
    format!("modes/{mode}")
}

pub fn shared_dir(mode: &str) -> String {
    format!("{}/{SHARED_DIR}", mode_dir(mode))
}

/// Remote path of a shared file, e.g. `modes/3-layer/_shared/agents.md`.
pub fn shared_path(mode: &str, filename: &str) -> String {
    format!("{}/{}", shared_dir(mode), filename)
}

pub fn forms_dir(mode: &str) -> String {
    format!("{}/forms", mode_dir(mode))
}

pub fn form_dir(mode: &str, form: &str) -> String {
    format!("{}/{}", forms_dir(mode), form)
}

pub fn manifest_path(mode: &str, form: &str) -> String {
    format!("{}/{}", form_dir(mode, form), MANIFEST_FILE)
}

/// Kind of a directory entry in the template repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// One entry of a template directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Entry name within its directory
    pub name: String,
    /// Full slash-separated path from the repository root
    pub path: String,
    pub kind: EntryKind,
}

/// Read access to a template repository at a branch or tag.
///
/// Implementations report an unreachable source as
/// [`Error::Unavailable`](crate::Error::Unavailable); callers treat that as
/// "status unknown" rather than a hard failure.
pub trait ContentSource {
    /// The revision marker (abbreviated commit id) `branch` currently points at.
    fn latest_revision(&self, branch: &str) -> Result<String>;

    /// The bytes at `path` in `branch`, or `None` when no such file exists.
    fn fetch(&self, path: &str, branch: &str) -> Result<Option<Vec<u8>>>;

    /// Entries of the directory at `path`, sorted by name. A missing
    /// directory lists as empty.
    fn list_dir(&self, path: &str, branch: &str) -> Result<Vec<SourceEntry>>;

    /// Fetch one of a mode's shared files.
    fn fetch_shared(&self, mode: &str, filename: &str, branch: &str) -> Result<Option<Vec<u8>>> {
        self.fetch(&shared_path(mode, filename), branch)
    }
}
