//! Template listing commands

use std::path::Path;
use std::process::ExitCode;

use arche_core::{list_forms, list_modes};
use colored::Colorize;

use crate::context;
use crate::error::Result;

/// Run the modes command
pub fn run_modes(source: Option<&Path>, branch: &str) -> Result<ExitCode> {
    let source = context::open_source(source)?;
    let modes = list_modes(&source, branch)?;

    println!("{}:", "Modes".bold());
    if modes.is_empty() {
        println!("  {}", "None".dimmed());
    }
    for mode in &modes {
        println!("  {} {}", "*".blue(), mode.cyan());
    }
    Ok(ExitCode::SUCCESS)
}

/// Run the forms command
pub fn run_forms(source: Option<&Path>, mode: &str, branch: &str) -> Result<ExitCode> {
    let source = context::open_source(source)?;
    let forms = list_forms(&source, mode, branch)?;

    println!("{} {}:", "Forms of".bold(), mode.cyan());
    if forms.is_empty() {
        println!("  {} (run {} to list modes)", "None".dimmed(), "arche modes".cyan());
    }
    for form in &forms {
        println!("  {} {}", "*".blue(), form);
    }
    Ok(ExitCode::SUCCESS)
}
