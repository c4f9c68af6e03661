//! Shared test utilities for the Arche workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`git`]: [`TemplateRepo`](git::TemplateRepo), a real template repository on disk
//! - [`memory`]: [`MemorySource`](memory::MemorySource), an in-memory content source
//! - [`project`]: [`TestProject`](project::TestProject), a temporary project root

pub mod git;
pub mod memory;
pub mod project;
