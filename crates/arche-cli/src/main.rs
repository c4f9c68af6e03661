//! Arche CLI
//!
//! Bootstraps projects from mode/form templates and keeps their framework
//! files in step with the template repository.

mod cli;
mod commands;
mod context;
mod error;

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::InitConfig;
use error::Result;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("  {} {}", "hint:".yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins unless `--verbose` is given; the default is warnings only.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init();
    tracing::debug!("Verbose mode enabled");
}

fn run(cli: Cli) -> Result<ExitCode> {
    let source = cli.source.as_deref();

    match cli.command {
        Some(Commands::Init {
            target,
            mode,
            form,
            branch,
            strategy,
            interval,
            no_telemetry,
            force,
            interactive,
        }) => commands::run_init(
            InitConfig {
                target,
                mode,
                form,
                branch,
                strategy,
                interval,
                telemetry: no_telemetry.then_some(false),
                force,
                interactive,
            },
            source,
        ),
        Some(Commands::Update(args)) => commands::run_update(&args, source),
        Some(Commands::Modes { branch }) => commands::run_modes(source, &branch),
        Some(Commands::Forms { mode, branch }) => commands::run_forms(source, &mode, &branch),
        None => {
            println!("{} - project templates that stay current", "arche".green().bold());
            println!();
            println!("Run {} for available commands.", "arche --help".cyan());
            Ok(ExitCode::SUCCESS)
        }
    }
}
