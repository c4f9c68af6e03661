//! The `.arche-config` provenance record
//!
//! One JSON document per project root records which template the project was
//! created from, which template revision its framework files were last
//! synced to, and how updates are handled. Keys this crate does not know are
//! kept verbatim across a load/save cycle.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use arche_fs::{ArchePath, NormalizedPath, ProjectLayout, io};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Branch followed when the config does not name one
pub const DEFAULT_BRANCH: &str = "main";

/// Interval used by the `prompt` strategy when none was configured
pub const DEFAULT_CHECK_INTERVAL_DAYS: u32 = 30;

/// Revision recorded when the config carries none
pub const UNKNOWN_REVISION: &str = "unknown";

/// How framework updates are handled for a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStrategy {
    /// Check and apply whenever the update command runs
    #[default]
    Auto,
    /// Never check; pinned to a revision
    Frozen,
    /// Check, but apply only on explicit request
    Manual,
    /// Suggest a check once per interval
    Prompt,
}

impl UpdateStrategy {
    pub const ALL: [UpdateStrategy; 4] = [Self::Auto, Self::Frozen, Self::Manual, Self::Prompt];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Frozen => "frozen",
            Self::Manual => "manual",
            Self::Prompt => "prompt",
        }
    }
}

impl fmt::Display for UpdateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| Error::InvalidStrategy {
                value: s.to_string(),
            })
    }
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn unknown_revision() -> String {
    UNKNOWN_REVISION.to_string()
}

/// Typed view of `.arche-config`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(rename = "update_strategy", default)]
    pub strategy: UpdateStrategy,

    pub mode: String,

    #[serde(default)]
    pub form: String,

    /// Revision marker of the last sync
    #[serde(rename = "arche_version", default = "unknown_revision")]
    pub revision: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(
        rename = "update_check_interval_days",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub check_interval_days: Option<u32>,

    #[serde(
        rename = "last_update_check",
        default,
        skip_serializing_if = "Option::is_none",
        with = "lenient_date"
    )]
    pub last_check: Option<NaiveDate>,

    #[serde(rename = "frozen_version", default, skip_serializing_if = "Option::is_none")]
    pub frozen_revision: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telemetry_enabled: Option<bool>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "lenient_date"
    )]
    pub created_at: Option<NaiveDate>,

    /// Keys not modelled above, preserved on save
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ProjectConfig {
    pub fn new(
        mode: impl Into<String>,
        form: impl Into<String>,
        revision: impl Into<String>,
    ) -> Self {
        Self {
            strategy: UpdateStrategy::default(),
            mode: mode.into(),
            form: form.into(),
            revision: revision.into(),
            branch: default_branch(),
            check_interval_days: None,
            last_check: None,
            frozen_revision: None,
            telemetry_enabled: None,
            created_at: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.strategy == UpdateStrategy::Frozen
    }

    /// The prompt interval in days, falling back to the default.
    pub fn interval_days(&self) -> u32 {
        self.check_interval_days
            .unwrap_or(DEFAULT_CHECK_INTERVAL_DAYS)
    }

    /// The revision a frozen project is pinned to.
    pub fn pinned_revision(&self) -> &str {
        self.frozen_revision.as_deref().unwrap_or(&self.revision)
    }
}

/// Loads and saves `.arche-config` for one project root.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: NormalizedPath,
}

impl ConfigStore {
    pub fn new(layout: &ProjectLayout) -> Self {
        Self {
            path: layout.config_path(),
        }
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the config.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigNotFound`] when the file is missing and
    /// [`Error::ConfigInvalid`] when it does not parse.
    pub fn load(&self) -> Result<ProjectConfig> {
        let content = io::read_optional(&self.path)?.ok_or_else(|| Error::ConfigNotFound {
            path: self.path.to_native(),
        })?;

        serde_json::from_slice(&content).map_err(|e| Error::ConfigInvalid {
            path: self.path.to_native(),
            message: e.to_string(),
        })
    }

    /// Save the config, replacing the file atomically.
    pub fn save(&self, config: &ProjectConfig) -> Result<()> {
        let content = serde_json::to_string_pretty(config)?;
        io::write_atomic(&self.path, content.as_bytes())?;
        debug!(path = %self.path, revision = %config.revision, "saved project config");
        Ok(())
    }
}

/// User-level defaults read from `~/.arche-config`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub telemetry_enabled: Option<bool>,
}

impl GlobalConfig {
    /// Path of the global config in the user's home directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(ArchePath::Config.as_str()))
    }

    /// Load the global config from the home directory.
    ///
    /// A missing or unreadable file yields the defaults.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "ignoring unreadable global config");
            Self::default()
        })
    }
}

/// Dates stored as `YYYY-MM-DD`; full ISO-8601 timestamps are accepted on
/// read and truncated to their date.
mod lenient_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_str(&date.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let date_part = raw.get(..10).unwrap_or(&raw);
        NaiveDate::parse_from_str(date_part, FORMAT)
            .map(Some)
            .map_err(|e| de::Error::custom(format!("invalid date '{raw}': {e}")))
    }
}
