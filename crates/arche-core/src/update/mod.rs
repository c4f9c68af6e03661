//! Update orchestration
//!
//! [`UpdateEngine`] runs the check / diff / apply / rollback cycle for one
//! project. Strategy rules that need no I/O live in [`policy`].

mod engine;
pub mod policy;
mod report;

pub use engine::UpdateEngine;
pub use policy::should_prompt;
pub use report::{
    ApplyReport, CheckOutcome, DiffEntry, DiffReport, PendingUpdate, RemoteFile, RollbackReport,
    RunOutcome, StatusReport,
};
