//! Command implementations for arche-cli

pub mod init;
pub mod templates;
pub mod update;

pub use init::{InitConfig, run_init};
pub use templates::{run_forms, run_modes};
pub use update::run_update;
