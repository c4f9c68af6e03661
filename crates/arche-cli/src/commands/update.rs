//! Update command implementation

use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;

use arche_core::{
    ApplyReport, CheckOutcome, DiffReport, PendingUpdate, RunOutcome, StatusReport, UpdateEngine,
    UpdateStrategy,
};
use arche_fs::FileStatus;
use colored::Colorize;
use dialoguer::Confirm;
use serde_json::json;

use crate::cli::UpdateArgs;
use crate::context;
use crate::error::Result;

/// Run the update command
pub fn run_update(args: &UpdateArgs, source: Option<&Path>) -> Result<ExitCode> {
    let root = context::project_root(&args.project)?;
    let engine = UpdateEngine::new(&root);

    if let Some(strategy) = &args.set_strategy {
        let config = engine.set_strategy(strategy, args.interval)?;
        if args.json {
            print_json(&config)?;
        } else {
            println!(
                "{} Update strategy set to: {}",
                "OK".green().bold(),
                config.strategy.to_string().cyan()
            );
            if config.strategy == UpdateStrategy::Prompt
                && let Some(days) = config.check_interval_days
            {
                println!("   Check interval: {days} days");
            }
            if let Some(frozen) = config.frozen_revision.as_deref().filter(|_| config.is_frozen()) {
                println!("   Frozen at: {}", frozen.cyan());
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(id) = &args.rollback {
        let report = engine.rollback(id)?;
        if args.json {
            print_json(&report)?;
        } else {
            println!("{} Rolled back to {}", "OK".green().bold(), report.id.to_string().cyan());
            for file in &report.restored {
                println!("  {} {}", "+".green(), file);
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(version) = &args.pin {
        let config = engine.pin(version)?;
        if args.json {
            print_json(&config)?;
        } else {
            println!("{} Pinned to version: {}", "OK".green().bold(), version.cyan());
        }
        return Ok(ExitCode::SUCCESS);
    }

    if args.list_backups {
        return list_backups(&engine, args.json);
    }

    if let Some(keep) = args.prune_backups {
        let removed = engine.prune_backups(keep)?;
        if args.json {
            print_json(&removed)?;
        } else if removed.is_empty() {
            println!("Nothing to prune ({} or fewer backups).", keep);
        } else {
            println!("{} Removed {} backup(s)", "OK".green().bold(), removed.len());
            for id in &removed {
                println!("  {} {}", "-".red(), id);
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = engine.config()?;
    if config.is_frozen() {
        if args.json {
            print_json(&json!({"status": "frozen", "revision": config.pinned_revision()}))?;
        } else {
            print_frozen(config.pinned_revision());
        }
        return Ok(ExitCode::SUCCESS);
    }

    let source = context::open_source(source)?;

    let result = if args.check {
        engine
            .check(&source)
            .map_err(Into::into)
            .and_then(|outcome| report_check(&outcome, args.json))
    } else if args.diff {
        engine
            .diff(&source)
            .map_err(Into::into)
            .and_then(|report| report_diff(&report, args.json))
    } else {
        if !args.json {
            print_header(&engine.status()?);
        }
        engine
            .run(&source, args.apply)
            .map_err(Into::into)
            .and_then(|outcome| report_run(&engine, outcome, args))
    };

    match result {
        Err(e) if e.is_recoverable() => {
            eprintln!("{} {}", "warning:".yellow().bold(), e);
            eprintln!("   Could not determine update status; continuing without updating.");
            Ok(ExitCode::SUCCESS)
        }
        other => other,
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_frozen(revision: &str) {
    println!("{} Update strategy: {}", "*".blue(), "frozen".cyan());
    println!("   This project will not receive updates (pinned at {}).", revision.cyan());
    println!("   To enable updates: {}", "arche update --set-strategy auto".cyan());
}

fn print_header(status: &StatusReport) {
    println!("{}", "Arche Update Status".bold());
    println!("{}: {}", "Strategy".dimmed(), status.strategy.to_string().cyan());
    println!("{}:     {}", "Mode".dimmed(), status.mode);
    println!("{}:  {}", "Version".dimmed(), status.revision);
    println!();
}

fn status_marker(status: FileStatus) -> colored::ColoredString {
    match status {
        FileStatus::New => "new".green(),
        FileStatus::Modified => "modified".yellow(),
        FileStatus::Unchanged => "unchanged".dimmed(),
    }
}

fn print_pending(pending: &PendingUpdate) {
    println!(
        "{} Updates available: {} -> {}",
        "^".yellow().bold(),
        pending.current.dimmed(),
        pending.revision.cyan()
    );
    for file in &pending.files {
        println!("  {} {} ({})", "~".yellow(), file.name, status_marker(file.status));
    }
}

fn print_applied(report: &ApplyReport) {
    if let Some(snapshot) = &report.snapshot {
        println!("{} Backup created: {}", "OK".green().bold(), snapshot.to_string().cyan());
    }
    for file in &report.written {
        println!("  {} Updated {}", "+".green(), file);
    }
    println!(
        "{} Updated to {} ({} files)",
        "OK".green().bold(),
        report.revision.cyan(),
        report.written.len()
    );
    if let Some(snapshot) = &report.snapshot {
        println!("   To undo: {}", format!("arche update --rollback {snapshot}").cyan());
    }
}

fn report_check(outcome: &CheckOutcome, json: bool) -> Result<ExitCode> {
    if json {
        print_json(outcome)?;
    } else {
        match outcome {
            CheckOutcome::Frozen { revision } => print_frozen(revision),
            CheckOutcome::UpToDate { revision } => {
                println!("{} Up to date ({})", "OK".green().bold(), revision.cyan());
            }
            CheckOutcome::UpdatesAvailable(pending) => {
                print_pending(pending);
                println!();
                println!("Run {} to install.", "arche update --apply".cyan());
            }
        }
    }
    Ok(if outcome.has_updates() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn report_diff(report: &DiffReport, json: bool) -> Result<ExitCode> {
    if json {
        print_json(report)?;
        return Ok(ExitCode::SUCCESS);
    }

    if report.frozen {
        println!("Project is frozen; no diff.");
        return Ok(ExitCode::SUCCESS);
    }

    println!(
        "{} against {}",
        "Differences".bold(),
        report.revision.as_deref().unwrap_or("unknown").cyan()
    );
    if report.entries.is_empty() {
        println!("  {} (no tracked files at source)", "None".dimmed());
    }
    for entry in &report.entries {
        let local = entry
            .local_lines
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<18} {:<10} {} -> {} lines  {} {}",
            entry.file,
            status_marker(entry.status),
            local,
            entry.remote_lines,
            format!("+{}", entry.inserted).green(),
            format!("-{}", entry.deleted).red(),
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn report_run(engine: &UpdateEngine, outcome: RunOutcome, args: &UpdateArgs) -> Result<ExitCode> {
    match outcome {
        RunOutcome::Frozen { revision } => {
            if args.json {
                print_json(&RunOutcome::Frozen { revision })?;
            } else {
                print_frozen(&revision);
            }
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::NotDue { next_check } => {
            if args.json {
                print_json(&RunOutcome::NotDue { next_check })?;
            } else {
                match next_check {
                    Some(date) => println!("Next update check due on {}.", date.to_string().cyan()),
                    None => println!("No update check due."),
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::UpToDate { revision } => {
            if args.json {
                print_json(&RunOutcome::UpToDate { revision })?;
            } else {
                println!("{} Up to date ({})", "OK".green().bold(), revision.cyan());
            }
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::Applied(report) => {
            if args.json {
                print_json(&RunOutcome::Applied(report))?;
            } else {
                print_applied(&report);
            }
            Ok(ExitCode::SUCCESS)
        }
        RunOutcome::Pending(pending) => report_pending(engine, pending, args),
    }
}

/// Updates found but not applied: `manual` always stops here, `prompt` asks.
fn report_pending(
    engine: &UpdateEngine,
    pending: PendingUpdate,
    args: &UpdateArgs,
) -> Result<ExitCode> {
    let strategy = engine.config()?.strategy;

    if strategy == UpdateStrategy::Prompt {
        if !args.json {
            print_pending(&pending);
        }
        let confirmed = args.yes
            || (std::io::stdin().is_terminal()
                && Confirm::new()
                    .with_prompt("Apply these updates?")
                    .default(true)
                    .interact()?);
        if confirmed {
            let report = engine.apply(&pending)?;
            if args.json {
                print_json(&RunOutcome::Applied(report))?;
            } else {
                print_applied(&report);
            }
            return Ok(ExitCode::SUCCESS);
        }
    }

    if args.json {
        print_json(&RunOutcome::Pending(pending))?;
    } else {
        if strategy != UpdateStrategy::Prompt {
            print_pending(&pending);
        }
        println!();
        println!("Updates available. Run {} to install.", "arche update --apply".cyan());
    }
    Ok(ExitCode::FAILURE)
}

fn list_backups(engine: &UpdateEngine, json: bool) -> Result<ExitCode> {
    let snapshots = engine.backups().list_snapshots()?;

    if json {
        let items: Vec<_> = snapshots
            .iter()
            .map(|s| {
                json!({
                    "id": s.id,
                    "revision": s.metadata.as_ref().and_then(|m| m.revision.clone()),
                    "files": s.metadata.as_ref().map(|m| m.files.clone()).unwrap_or_default(),
                })
            })
            .collect();
        print_json(&items)?;
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}:", "Backups".bold());
    if snapshots.is_empty() {
        println!("  {}", "None".dimmed());
    }
    for snapshot in &snapshots {
        let detail = match &snapshot.metadata {
            Some(m) => format!(
                "{} files, from {}",
                m.files.len(),
                m.revision.as_deref().unwrap_or("unknown")
            ),
            None => "no metadata".to_string(),
        };
        println!("  {} {} ({})", "*".blue(), snapshot.id.to_string().cyan(), detail.dimmed());
    }
    Ok(ExitCode::SUCCESS)
}
