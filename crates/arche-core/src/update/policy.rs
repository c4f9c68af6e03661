//! Strategy rules that need no I/O
//!
//! These operate on a [`ProjectConfig`] value; the engine loads and saves
//! around them.

use chrono::{Days, NaiveDate};

use crate::config::{DEFAULT_CHECK_INTERVAL_DAYS, ProjectConfig, UpdateStrategy};
use crate::{Error, Result};

/// Whether a `prompt` project is due for an update check on `today`.
///
/// Always false for the other strategies. A project that has never been
/// checked is due immediately.
pub fn should_prompt(config: &ProjectConfig, today: NaiveDate) -> bool {
    if config.strategy != UpdateStrategy::Prompt {
        return false;
    }
    match config.last_check {
        None => true,
        Some(last) => (today - last).num_days() >= i64::from(config.interval_days()),
    }
}

/// The first day a `prompt` project becomes due, if it has been checked before.
pub fn next_check(config: &ProjectConfig) -> Option<NaiveDate> {
    if config.strategy != UpdateStrategy::Prompt {
        return None;
    }
    config
        .last_check?
        .checked_add_days(Days::new(u64::from(config.interval_days())))
}

/// Switch `config` to `strategy`.
///
/// `interval` only applies to `prompt`; other strategies leave the stored
/// interval alone.
///
/// # Errors
///
/// Returns [`Error::InvalidInterval`] for a zero interval, before `config`
/// is touched.
pub fn apply_strategy(
    config: &mut ProjectConfig,
    strategy: UpdateStrategy,
    interval: Option<u32>,
) -> Result<()> {
    if let Some(0) = interval {
        return Err(Error::InvalidInterval { days: 0 });
    }

    match strategy {
        UpdateStrategy::Frozen => {
            config.frozen_revision = Some(config.revision.clone());
        }
        UpdateStrategy::Prompt => {
            config.check_interval_days = Some(
                interval
                    .or(config.check_interval_days)
                    .unwrap_or(DEFAULT_CHECK_INTERVAL_DAYS),
            );
        }
        UpdateStrategy::Auto | UpdateStrategy::Manual => {}
    }
    config.strategy = strategy;
    Ok(())
}

/// Freeze `config` at `version`.
pub fn pin(config: &mut ProjectConfig, version: &str) {
    config.strategy = UpdateStrategy::Frozen;
    config.frozen_revision = Some(version.to_string());
    config.revision = version.to_string();
}
