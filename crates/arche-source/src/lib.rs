//! Template content sources for the Arche toolkit
//!
//! A [`ContentSource`] answers two questions about the template repository:
//! what revision a branch currently points at, and what bytes live at a path
//! in that revision. [`GitSource`] answers them from a local clone.

pub mod error;
pub mod git;
pub mod source;

pub use error::{Error, Result};
pub use git::GitSource;
pub use source::{
    ContentSource, EntryKind, MANIFEST_FILE, SHARED_DIR, SourceEntry, form_dir, forms_dir,
    manifest_path, shared_dir, shared_path,
};
