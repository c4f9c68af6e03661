//! Filesystem layer for the Arche toolkit
//!
//! Provides project-root path resolution, content fingerprints and
//! atomic I/O. Nothing in this crate knows about templates or strategies.

pub mod checksum;
pub mod constants;
pub mod error;
pub mod io;
pub mod layout;
pub mod path;

pub use checksum::{Comparison, FileStatus, Fingerprint, classify, compare, fingerprint};
pub use constants::{ArchePath, TRACKED_FILES};
pub use error::{Error, Result};
pub use layout::ProjectLayout;
pub use path::{NormalizedPath, validate_relative_path};
