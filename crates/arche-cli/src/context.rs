//! Project and template source resolution
//!
//! Turns the `--project` / `--source` arguments into a canonical project
//! root and a [`GitSource`].

use std::path::{Path, PathBuf};

use arche_source::GitSource;
use tracing::debug;

use crate::error::{CliError, Result};

/// Canonical project root for `path`.
pub fn project_root(path: &Path) -> Result<PathBuf> {
    let root = dunce::canonicalize(path).map_err(|e| {
        CliError::user(format!("Project directory {} not accessible: {e}", path.display()))
    })?;
    debug!(root = %root.display(), "resolved project root");
    Ok(root)
}

/// The template source named by `--source` or `ARCHE_SOURCE`.
pub fn open_source(source: Option<&Path>) -> Result<GitSource> {
    let Some(path) = source else {
        return Err(CliError::user(
            "No template source configured. Pass --source <PATH> or set ARCHE_SOURCE \
             to a local clone of the arche repository.",
        ));
    };
    let path = dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    debug!(source = %path.display(), "using template source");
    Ok(GitSource::new(path))
}
