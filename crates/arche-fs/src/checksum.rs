//! SHA-256 content fingerprints
//!
//! Every fingerprint renders in the canonical `sha256:<hex>` form. The update
//! pipeline compares fingerprints of local files against fingerprints of the
//! remote content to decide whether a file has drifted.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Prefix for all fingerprints produced by this module
const PREFIX: &str = "sha256:";

/// A content digest in the canonical `sha256:<hex>` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// The full `sha256:<hex>` string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The hex digest without the algorithm prefix.
    pub fn hex(&self) -> &str {
        self.0.strip_prefix(PREFIX).unwrap_or(&self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the fingerprint of raw content.
pub fn fingerprint(content: &[u8]) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(content);
    Fingerprint(format!("{}{:x}", PREFIX, hasher.finalize()))
}

/// Outcome of comparing two fingerprints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Unchanged,
    Changed,
}

/// Compare a local fingerprint against a remote one.
pub fn compare(local: &Fingerprint, remote: &Fingerprint) -> Comparison {
    if local == remote {
        Comparison::Unchanged
    } else {
        Comparison::Changed
    }
}

/// Drift classification of a tracked file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Present remotely, absent locally
    New,
    /// Present on both sides with different content
    Modified,
    /// Identical content on both sides
    Unchanged,
}

impl FileStatus {
    /// Whether applying the remote content would change the local file.
    pub fn needs_update(self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Modified => "modified",
            Self::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a file given its local fingerprint (if present) and the remote one.
///
/// A file absent locally is always [`FileStatus::New`].
pub fn classify(local: Option<&Fingerprint>, remote: &Fingerprint) -> FileStatus {
    match local {
        None => FileStatus::New,
        Some(local) => match compare(local, remote) {
            Comparison::Unchanged => FileStatus::Unchanged,
            Comparison::Changed => FileStatus::Modified,
        },
    }
}
