//! Init command implementation

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use arche_core::{BootstrapOptions, UpdateStrategy, initialize_project, list_forms, list_modes};
use arche_source::ContentSource;
use colored::Colorize;
use dialoguer::{Confirm, Select};

use crate::context;
use crate::error::{CliError, Result};

/// Arguments of `arche init`
#[derive(Debug, Clone)]
pub struct InitConfig {
    pub target: PathBuf,
    pub mode: Option<String>,
    pub form: Option<String>,
    pub branch: String,
    pub strategy: String,
    pub interval: Option<u32>,
    pub telemetry: Option<bool>,
    pub force: bool,
    pub interactive: bool,
}

/// Run the init command
pub fn run_init(config: InitConfig, source: Option<&Path>) -> Result<ExitCode> {
    let source = context::open_source(source)?;
    let strategy: UpdateStrategy = config.strategy.parse()?;

    let (mode, form, telemetry) = if config.interactive {
        interactive_select(&source, &config)?
    } else {
        let mode = config
            .mode
            .clone()
            .ok_or_else(|| CliError::user("--mode is required (or use --interactive)"))?;
        let form = config
            .form
            .clone()
            .ok_or_else(|| CliError::user("--form is required (or use --interactive)"))?;
        (mode, form, config.telemetry)
    };

    let mut options = BootstrapOptions::new(mode, form, &config.target);
    options.branch = config.branch.clone();
    options.strategy = strategy;
    options.interval = config.interval;
    options.telemetry = telemetry;
    options.force = config.force;

    println!(
        "{} Initializing {} / {} from {}",
        "=>".blue().bold(),
        options.mode.cyan(),
        options.form.cyan(),
        options.branch
    );

    let report = initialize_project(&source, &options)?;

    if let Some(name) = &report.manifest.name {
        println!("{}: {}", "Template".dimmed(), name);
    }
    if let Some(description) = &report.manifest.description {
        println!("{}: {}", "Description".dimmed(), description);
    }
    println!();
    for file in &report.files {
        println!("  {} {}", "+".green(), file);
    }
    for dir in &report.directories {
        println!("  {} {}/", "+".green(), dir);
    }
    if report.telemetry {
        println!("  {} .arche-telemetry", "+".green());
    }
    println!(
        "  {} .arche-config (update strategy: {})",
        "+".green(),
        report.config.strategy.to_string().cyan()
    );

    println!();
    println!(
        "{} Initialized project at {} ({} files, revision {})",
        "OK".green().bold(),
        config.target.display(),
        report.files.len(),
        report.config.revision.cyan()
    );

    println!();
    println!("{}:", "Next steps".bold());
    println!("  cd {}", config.target.display());
    if report.manifest.uses_language("python") {
        println!("  python3 -m venv venv");
        println!("  source venv/bin/activate");
        println!("  pip install -r requirements.txt");
    } else {
        println!("  # Follow the setup instructions in README.md");
    }

    Ok(ExitCode::SUCCESS)
}

/// Prompt for mode, form and telemetry, using any values already given as defaults.
fn interactive_select(
    source: &dyn ContentSource,
    config: &InitConfig,
) -> Result<(String, String, Option<bool>)> {
    let modes = list_modes(source, &config.branch)?;
    if modes.is_empty() {
        return Err(CliError::user("No modes found in the template source"));
    }
    let default_mode = config
        .mode
        .as_ref()
        .and_then(|m| modes.iter().position(|x| x == m))
        .unwrap_or(0);
    let mode_idx = Select::new()
        .with_prompt("Mode")
        .items(&modes)
        .default(default_mode)
        .interact()?;
    let mode = modes[mode_idx].clone();

    let forms = list_forms(source, &mode, &config.branch)?;
    if forms.is_empty() {
        return Err(CliError::user(format!("Mode '{mode}' has no forms")));
    }
    let default_form = config
        .form
        .as_ref()
        .and_then(|f| forms.iter().position(|x| x == f))
        .unwrap_or(0);
    let form_idx = Select::new()
        .with_prompt("Form")
        .items(&forms)
        .default(default_form)
        .interact()?;
    let form = forms[form_idx].clone();

    let telemetry = match config.telemetry {
        Some(explicit) => Some(explicit),
        None => Some(
            Confirm::new()
                .with_prompt("Enable telemetry?")
                .default(true)
                .interact()?,
        ),
    };

    Ok((mode, form, telemetry))
}
