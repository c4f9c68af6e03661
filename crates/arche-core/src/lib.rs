//! Bootstrap and update orchestration for the Arche toolkit
//!
//! This crate implements:
//!
//! - **Configuration**: the typed `.arche-config` provenance record
//! - **Backups**: timestamped snapshots of tracked files and their restore
//! - **History**: the append-only `.arche-update.log`
//! - **Bootstrap**: copying a mode/form template into a new project
//! - **UpdateEngine**: check, diff, apply and rollback of framework files,
//!   gated by the project's update strategy
//!
//! # Architecture
//!
//! ```text
//!               arche-cli
//!                   |
//!              arche-core
//!                   |
//!          +--------+--------+
//!          |                 |
//!      arche-fs        arche-source
//! ```
//!
//! # Example
//!
//! ```ignore
//! use arche_core::UpdateEngine;
//! use arche_source::GitSource;
//!
//! let engine = UpdateEngine::new("/path/to/project");
//! let source = GitSource::new("/path/to/arche");
//! let outcome = engine.check(&source)?;
//! ```

pub mod backup;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod history;
pub mod lock;
pub mod update;

pub use backup::{BackupManager, Snapshot, SnapshotId, SnapshotMetadata};
pub use bootstrap::{
    BootstrapOptions, BootstrapReport, FormManifest, initialize_project, list_forms, list_modes,
};
pub use config::{ConfigStore, GlobalConfig, ProjectConfig, UpdateStrategy};
pub use error::{Error, Result};
pub use history::{UpdateLog, UpdateLogEntry};
pub use lock::ProjectLock;
pub use update::{
    ApplyReport, CheckOutcome, DiffEntry, DiffReport, PendingUpdate, RemoteFile,
    RollbackReport, RunOutcome, StatusReport, UpdateEngine, should_prompt,
};
