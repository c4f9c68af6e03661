//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};

/// Arche - bootstrap projects from mode/form templates and keep them current
#[derive(Parser, Debug)]
#[command(name = "arche")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Local clone of the template repository
    #[arg(long, global = true, env = "ARCHE_SOURCE", value_name = "PATH")]
    pub source: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Initialize a project from a mode/form template
    ///
    /// Examples:
    ///   arche init --mode 3-layer --form library my-lib
    ///   arche init --interactive
    ///   arche init --mode 3-layer --form library --strategy prompt --interval 14
    Init {
        /// Target directory (created if missing)
        #[arg(default_value = ".")]
        target: PathBuf,

        /// Template family
        #[arg(short, long)]
        mode: Option<String>,

        /// Template variant within the mode
        #[arg(short, long)]
        form: Option<String>,

        /// Branch or tag of the template repository
        #[arg(short, long, default_value = "main")]
        branch: String,

        /// Update strategy: auto, frozen, manual or prompt
        #[arg(long, default_value = "auto")]
        strategy: String,

        /// Days between checks for the prompt strategy
        #[arg(long)]
        interval: Option<u32>,

        /// Do not write .arche-telemetry
        #[arg(long)]
        no_telemetry: bool,

        /// Re-initialize a directory that already has .arche-config
        #[arg(long)]
        force: bool,

        /// Choose mode and form interactively
        #[arg(short, long)]
        interactive: bool,
    },

    /// Check for, preview, apply or roll back framework file updates
    ///
    /// Without an action flag, runs the project's update strategy.
    Update(UpdateArgs),

    /// List available modes
    Modes {
        /// Branch or tag of the template repository
        #[arg(short, long, default_value = "main")]
        branch: String,
    },

    /// List the forms of a mode
    Forms {
        /// Mode to list forms for
        mode: String,

        /// Branch or tag of the template repository
        #[arg(short, long, default_value = "main")]
        branch: String,
    },
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
#[command(group(
    ArgGroup::new("action")
        .args([
            "check",
            "diff",
            "apply",
            "set_strategy",
            "rollback",
            "pin",
            "list_backups",
            "prune_backups",
        ])
))]
pub struct UpdateArgs {
    /// Project root
    #[arg(long, env = "ARCHE_PROJECT", default_value = ".", value_name = "PATH")]
    pub project: PathBuf,

    /// Report whether updates are available (exit 1 if they are)
    #[arg(long)]
    pub check: bool,

    /// Show per-file differences without changing anything
    #[arg(long)]
    pub diff: bool,

    /// Apply available updates regardless of strategy (except frozen)
    #[arg(long)]
    pub apply: bool,

    /// Change the update strategy
    #[arg(long, value_name = "STRATEGY")]
    pub set_strategy: Option<String>,

    /// Check interval in days, with --set-strategy prompt
    #[arg(long, requires = "set_strategy")]
    pub interval: Option<u32>,

    /// Restore the backup taken at TIMESTAMP (YYYYMMDD-HHMMSS)
    #[arg(long, value_name = "TIMESTAMP")]
    pub rollback: Option<String>,

    /// Freeze the project at VERSION
    #[arg(long, value_name = "VERSION")]
    pub pin: Option<String>,

    /// List backups, newest first
    #[arg(long)]
    pub list_backups: bool,

    /// Delete all but the newest KEEP backups
    #[arg(long, value_name = "KEEP")]
    pub prune_backups: Option<usize>,

    /// Apply without asking when the prompt strategy finds updates
    #[arg(short, long)]
    pub yes: bool,

    /// Output as JSON for scripting
    #[arg(long)]
    pub json: bool,
}
