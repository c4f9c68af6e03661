//! Error types for arche-source

use std::path::PathBuf;

/// Result type for arche-source operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading template content
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source cannot be reached or the revision cannot be resolved
    #[error("Template source unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Template repository not found at {path}")]
    RepositoryNotFound { path: PathBuf },

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),
}

impl Error {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Whether the error means "could not reach the source" rather than a
    /// fault in the content itself.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::RepositoryNotFound { .. })
    }
}
