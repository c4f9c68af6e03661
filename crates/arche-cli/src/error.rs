//! Error types for arche-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from arche-core
    #[error(transparent)]
    Core(#[from] arche_core::Error),

    /// Error from arche-fs
    #[error(transparent)]
    Fs(#[from] arche_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON output error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Interactive prompt error
    #[error("Interactive prompt error: {0}")]
    Dialoguer(#[from] dialoguer::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }

    /// The next step to suggest alongside the error, if any.
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Core(e) => e.hint(),
            Self::Fs(_) | Self::Io(_) => Some(
                "Check that the project directory exists and that you can write to it.".into(),
            ),
            Self::Json(_) | Self::Dialoguer(_) => {
                Some("Retry, or pass the choices as flags (see `arche --help`).".into())
            }
            Self::User { .. } => Some("Run `arche --help` for usage.".into()),
        }
    }

    /// Whether the failure only means "status unknown".
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_recoverable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn every_failure_suggests_a_next_step() {
        let errors = [
            CliError::user("No modes found in the template source"),
            CliError::Io(std::io::Error::other("disk full")),
            CliError::Fs(arche_fs::Error::io("/tmp/agents.md", std::io::Error::other("denied"))),
            CliError::Core(arche_core::Error::ConfigNotFound {
                path: PathBuf::from(".arche-config"),
            }),
        ];
        for err in &errors {
            assert!(err.hint().is_some(), "no hint for: {err}");
        }
    }

    #[test]
    fn core_io_hint_names_the_path() {
        let err = CliError::Core(arche_core::Error::Fs(arche_fs::Error::io(
            "/project/INSTRUCTIONS.md",
            std::io::Error::other("Is a directory"),
        )));
        let hint = err.hint().unwrap();
        assert!(hint.contains("/project/INSTRUCTIONS.md"));
        assert!(hint.contains("--rollback"));
    }
}
