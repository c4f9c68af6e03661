//! End-to-end update scenarios against an in-memory source.

use arche_core::{
    CheckOutcome, Error, PendingUpdate, RemoteFile, RunOutcome, UpdateEngine, UpdateStrategy,
};
use arche_fs::{FileStatus, fingerprint};
use arche_test_utils::memory::MemorySource;
use arche_test_utils::project::TestProject;
use chrono::{NaiveDate, NaiveDateTime};
use pretty_assertions::assert_eq;
use serde_json::json;

const MODE: &str = "3-layer";

const AGENTS: &str = "# Agents\n\nShared agent guidance.\n";
const INSTRUCTIONS: &str = "# Instructions\n";
const INIT_ENV: &str = "# Environment\n";

fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 14)
        .unwrap()
        .and_hms_opt(9, 30, 12)
        .unwrap()
}

fn engine(project: &TestProject) -> UpdateEngine {
    UpdateEngine::new(project.root()).with_clock(fixed_now)
}

/// A project at `abc1234` whose three tracked files match the source.
fn synced_project(strategy: &str) -> TestProject {
    let project = TestProject::new();
    project.init_config(MODE, "abc1234", strategy);
    project.write("agents.md", AGENTS);
    project.write("INSTRUCTIONS.md", INSTRUCTIONS);
    project.write("init_env.md", INIT_ENV);
    project
}

fn source_at(revision: &str) -> MemorySource {
    let source = MemorySource::at_revision(revision);
    source.put_shared(MODE, "agents.md", AGENTS);
    source.put_shared(MODE, "INSTRUCTIONS.md", INSTRUCTIONS);
    source.put_shared(MODE, "init_env.md", INIT_ENV);
    source
}

const AGENTS_V2: &str = "# Agents\n\nShared agent guidance.\n\nNew section.\n";

#[test]
fn matching_revision_is_up_to_date_without_fetching_files() {
    let project = synced_project("auto");
    let source = source_at("abc1234");

    let outcome = engine(&project).check(&source).unwrap();

    assert_eq!(
        outcome,
        CheckOutcome::UpToDate {
            revision: "abc1234".into()
        }
    );
    assert_eq!(source.revision_calls(), 1);
    assert_eq!(source.fetch_calls(), 0);
}

#[test]
fn one_changed_file_is_reported_and_applied() {
    let project = synced_project("manual");
    let source = source_at("def5678");
    source.put_shared(MODE, "agents.md", AGENTS_V2);
    let engine = engine(&project);

    let CheckOutcome::UpdatesAvailable(pending) = engine.check(&source).unwrap() else {
        panic!("expected updates");
    };
    assert_eq!(pending.current, "abc1234");
    assert_eq!(pending.revision, "def5678");
    assert_eq!(pending.file_names(), vec!["agents.md"]);
    assert_eq!(pending.files[0].status, FileStatus::Modified);

    let report = engine.apply(&pending).unwrap();

    assert_eq!(report.written, vec!["agents.md".to_string()]);
    assert_eq!(project.backup_dirs(), vec!["20261014-093012".to_string()]);
    assert_eq!(project.read("agents.md"), AGENTS_V2);
    assert_eq!(project.read(".arche-backups/20261014-093012/agents.md"), AGENTS);

    let config = project.read_config();
    assert_eq!(config["arche_version"], "def5678");
    assert_eq!(config["last_update_check"], "2026-10-14");
    project.assert_file_contains(
        ".arche-update.log",
        "[2026-10-14T09:30:12] Updated to def5678 - 1 files",
    );
}

#[test]
fn check_after_apply_is_up_to_date() {
    let project = synced_project("manual");
    let source = source_at("def5678");
    source.put_shared(MODE, "agents.md", AGENTS_V2);
    let engine = engine(&project);

    let CheckOutcome::UpdatesAvailable(pending) = engine.check(&source).unwrap() else {
        panic!("expected updates");
    };
    engine.apply(&pending).unwrap();

    assert!(!engine.check(&source).unwrap().has_updates());
}

#[test]
fn rollback_restores_pre_apply_bytes() {
    let project = synced_project("manual");
    project.write("agents.md", "# Local edits\n");
    let before: Vec<_> = ["agents.md", "INSTRUCTIONS.md", "init_env.md", ".arche-config"]
        .iter()
        .map(|f| fingerprint(project.read(f).as_bytes()))
        .collect();

    let source = source_at("def5678");
    source.put_shared(MODE, "agents.md", AGENTS_V2);
    source.put_shared(MODE, "init_env.md", "# Environment v2\n");
    let engine = engine(&project);

    let CheckOutcome::UpdatesAvailable(pending) = engine.check(&source).unwrap() else {
        panic!("expected updates");
    };
    let applied = engine.apply(&pending).unwrap();
    let snapshot = applied.snapshot.unwrap();

    let calls = source.calls();
    let report = engine.rollback(snapshot.as_str()).unwrap();
    assert_eq!(source.calls(), calls);

    let after: Vec<_> = ["agents.md", "INSTRUCTIONS.md", "init_env.md", ".arche-config"]
        .iter()
        .map(|f| fingerprint(project.read(f).as_bytes()))
        .collect();
    assert_eq!(after, before);
    assert!(report.restored.contains(&".arche-config".to_string()));
}

#[test]
fn frozen_check_never_contacts_source() {
    let project = synced_project("auto");
    let source = source_at("def5678");
    source.put_shared(MODE, "agents.md", AGENTS_V2);
    let engine = engine(&project);

    let config = engine.set_strategy("frozen", None).unwrap();
    assert_eq!(config.frozen_revision.as_deref(), Some("abc1234"));

    let outcome = engine.check(&source).unwrap();
    assert_eq!(
        outcome,
        CheckOutcome::Frozen {
            revision: "abc1234".into()
        }
    );
    assert!(engine.diff(&source).unwrap().frozen);
    assert_eq!(
        engine.run(&source, true).unwrap(),
        RunOutcome::Frozen {
            revision: "abc1234".into()
        }
    );
    assert_eq!(source.calls(), 0);
}

#[test]
fn invalid_strategy_leaves_config_untouched() {
    let project = synced_project("auto");
    let before = project.read(".arche-config");

    let err = engine(&project).set_strategy("bogus", Some(7)).unwrap_err();

    assert!(matches!(err, Error::InvalidStrategy { ref value } if value == "bogus"));
    assert_eq!(project.read(".arche-config"), before);
}

#[test]
fn prompt_strategy_keeps_interval() {
    let project = synced_project("auto");
    let engine = engine(&project);

    engine.set_strategy("prompt", Some(7)).unwrap();
    engine.set_strategy("manual", None).unwrap();
    let config = engine.set_strategy("prompt", None).unwrap();

    assert_eq!(config.strategy, UpdateStrategy::Prompt);
    assert_eq!(config.check_interval_days, Some(7));
    assert!(matches!(
        engine.set_strategy("prompt", Some(0)),
        Err(Error::InvalidInterval { days: 0 })
    ));
}

#[test]
fn empty_apply_is_a_no_op() {
    let project = synced_project("manual");
    let before = project.read(".arche-config");
    let pending = PendingUpdate {
        current: "abc1234".into(),
        revision: "def5678".into(),
        files: Vec::new(),
    };

    let report = engine(&project).apply(&pending).unwrap();

    assert_eq!(report.snapshot, None);
    assert!(project.backup_dirs().is_empty());
    assert_eq!(project.read(".arche-config"), before);
    assert!(!project.exists(".arche-update.log"));
}

#[test]
fn missing_local_file_is_new() {
    let project = TestProject::new();
    project.init_config(MODE, "abc1234", "manual");
    project.write("agents.md", AGENTS);
    project.write("INSTRUCTIONS.md", INSTRUCTIONS);
    let source = source_at("def5678");

    let CheckOutcome::UpdatesAvailable(pending) = engine(&project).check(&source).unwrap() else {
        panic!("expected updates");
    };

    assert_eq!(pending.file_names(), vec!["init_env.md"]);
    assert_eq!(pending.files[0].status, FileStatus::New);
}

#[test]
fn moved_revision_with_identical_files_is_up_to_date() {
    let project = synced_project("manual");
    let source = source_at("def5678");

    let outcome = engine(&project).check(&source).unwrap();

    assert_eq!(
        outcome,
        CheckOutcome::UpToDate {
            revision: "def5678".into()
        }
    );
}

#[test]
fn offline_source_is_recoverable() {
    let project = synced_project("auto");
    let source = source_at("def5678");
    source.go_offline();

    let err = engine(&project).check(&source).unwrap_err();

    assert!(matches!(err, Error::NetworkUnavailable { .. }), "got: {err}");
    assert!(err.is_recoverable());
    assert!(err.hint().is_some());
}

#[test]
fn missing_config_is_reported() {
    let project = TestProject::new();
    let source = source_at("abc1234");

    let err = engine(&project).check(&source).unwrap_err();

    assert!(matches!(err, Error::ConfigNotFound { .. }));
    assert_eq!(source.calls(), 0);
}

#[test]
fn rollback_unknown_snapshot() {
    let project = synced_project("auto");
    let engine = engine(&project);

    for id in ["20200101-000000", "yesterday", "../../etc"] {
        let err = engine.rollback(id).unwrap_err();
        assert!(matches!(err, Error::SnapshotNotFound { .. }), "{id}: {err}");
    }
}

#[test]
fn partial_write_keeps_written_files_and_backup() {
    let project = synced_project("manual");
    std::fs::remove_file(project.root().join("INSTRUCTIONS.md")).unwrap();
    std::fs::create_dir(project.root().join("INSTRUCTIONS.md")).unwrap();
    let before = project.read(".arche-config");

    let pending = PendingUpdate {
        current: "abc1234".into(),
        revision: "def5678".into(),
        files: vec![
            RemoteFile {
                name: "agents.md".into(),
                content: AGENTS_V2.as_bytes().to_vec(),
                status: FileStatus::Modified,
            },
            RemoteFile {
                name: "INSTRUCTIONS.md".into(),
                content: b"# Instructions v2\n".to_vec(),
                status: FileStatus::Modified,
            },
        ],
    };

    let err = engine(&project).apply(&pending).unwrap_err();

    let Error::PartialWriteFailure {
        snapshot,
        written,
        failed,
    } = &err
    else {
        panic!("expected partial failure, got {err}");
    };
    assert_eq!(snapshot, "20261014-093012");
    assert_eq!(written, &vec!["agents.md".to_string()]);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, "INSTRUCTIONS.md");
    assert!(err.hint().unwrap().contains("--rollback 20261014-093012"));
    let message = err.to_string();
    assert!(message.contains("written: agents.md"), "got: {message}");
    assert!(message.contains("failed: INSTRUCTIONS.md ("), "got: {message}");

    assert_eq!(project.read("agents.md"), AGENTS_V2);
    assert_eq!(project.backup_dirs(), vec!["20261014-093012".to_string()]);
    assert_eq!(project.read(".arche-config"), before);
}

#[test]
fn unreadable_tracked_file_suggests_next_step() {
    let project = synced_project("manual");
    std::fs::remove_file(project.root().join("INSTRUCTIONS.md")).unwrap();
    std::fs::create_dir(project.root().join("INSTRUCTIONS.md")).unwrap();
    let source = source_at("def5678");
    source.put_shared(MODE, "agents.md", AGENTS_V2);

    let err = engine(&project).check(&source).unwrap_err();

    assert!(matches!(err, Error::Fs(arche_fs::Error::Io { .. })), "got: {err}");
    assert!(!err.is_recoverable());
    let hint = err.hint().expect("filesystem errors carry a hint");
    assert!(hint.contains("INSTRUCTIONS.md"), "got: {hint}");
    assert!(hint.contains("--list-backups"), "got: {hint}");
}

#[test]
fn diff_reports_line_counts_without_writing() {
    let project = synced_project("auto");
    let before = project.read(".arche-config");
    let source = source_at("def5678");
    source.put_shared(MODE, "agents.md", AGENTS_V2);

    let report = engine(&project).diff(&source).unwrap();

    assert!(!report.frozen);
    assert_eq!(report.revision.as_deref(), Some("def5678"));
    assert_eq!(report.entries.len(), 3);
    let agents = &report.entries[0];
    assert_eq!(agents.file, "agents.md");
    assert_eq!(agents.status, FileStatus::Modified);
    assert_eq!(agents.local_lines, Some(3));
    assert_eq!(agents.remote_lines, 5);
    assert_eq!((agents.inserted, agents.deleted), (2, 0));
    assert_eq!(report.changed().count(), 1);

    assert_eq!(project.read("agents.md"), AGENTS);
    assert_eq!(project.read(".arche-config"), before);
    assert!(project.backup_dirs().is_empty());
}

#[test]
fn pin_freezes_at_version() {
    let project = synced_project("auto");

    engine(&project).pin("v1.2.0").unwrap();

    let config = project.read_config();
    assert_eq!(config["update_strategy"], "frozen");
    assert_eq!(config["frozen_version"], "v1.2.0");
    assert_eq!(config["arche_version"], "v1.2.0");
}

#[test]
fn run_manual_withholds_apply() {
    let project = synced_project("manual");
    let source = source_at("def5678");
    source.put_shared(MODE, "agents.md", AGENTS_V2);
    let engine = engine(&project);

    let outcome = engine.run(&source, false).unwrap();
    assert!(matches!(outcome, RunOutcome::Pending(ref p) if p.file_names() == vec!["agents.md"]));
    assert_eq!(project.read("agents.md"), AGENTS);

    let RunOutcome::Applied(report) = engine.run(&source, true).unwrap() else {
        panic!("expected apply");
    };
    assert_eq!(report.revision, "def5678");
    assert_eq!(project.read("agents.md"), AGENTS_V2);
}

#[test]
fn run_auto_applies() {
    let project = synced_project("auto");
    let source = source_at("def5678");
    source.put_shared(MODE, "agents.md", AGENTS_V2);

    let outcome = engine(&project).run(&source, false).unwrap();

    assert!(matches!(outcome, RunOutcome::Applied(_)));
    assert_eq!(project.read_config()["arche_version"], "def5678");
}

fn prompt_project(last_check: &str, interval: u32) -> TestProject {
    let project = synced_project("prompt");
    project.write_config(&json!({
        "update_strategy": "prompt",
        "mode": MODE,
        "form": "library",
        "arche_version": "abc1234",
        "branch": "main",
        "update_check_interval_days": interval,
        "last_update_check": last_check,
    }));
    project
}

#[test]
fn run_prompt_not_due_skips_source() {
    let project = prompt_project("2026-10-10", 7);
    let source = source_at("def5678");
    let engine = engine(&project);

    assert!(!engine.should_prompt().unwrap());
    let outcome = engine.run(&source, false).unwrap();

    assert_eq!(
        outcome,
        RunOutcome::NotDue {
            next_check: NaiveDate::from_ymd_opt(2026, 10, 17)
        }
    );
    assert_eq!(source.calls(), 0);
}

#[test]
fn run_prompt_due_records_check_and_defers() {
    let project = prompt_project("2026-09-01", 30);
    let source = source_at("def5678");
    source.put_shared(MODE, "agents.md", AGENTS_V2);
    let engine = engine(&project);

    assert!(engine.should_prompt().unwrap());
    let outcome = engine.run(&source, false).unwrap();

    assert!(matches!(outcome, RunOutcome::Pending(_)));
    assert_eq!(project.read_config()["last_update_check"], "2026-10-14");
    assert_eq!(project.read("agents.md"), AGENTS);
    assert!(!engine.should_prompt().unwrap());
}

#[test]
fn status_reads_local_state_only() {
    let project = prompt_project("2026-10-10", 7);
    let engine = engine(&project);

    let status = engine.status().unwrap();

    assert_eq!(status.strategy, UpdateStrategy::Prompt);
    assert_eq!(status.revision, "abc1234");
    assert!(!status.prompt_due);
    assert_eq!(status.next_check, NaiveDate::from_ymd_opt(2026, 10, 17));
    assert_eq!(status.last_update, None);
    assert_eq!(status.snapshots, 0);
}

#[test]
fn unknown_config_keys_survive_apply() {
    let project = synced_project("manual");
    let mut config = project.read_config();
    config["team"] = json!({"size": 4});
    project.write_config(&config);

    let source = source_at("def5678");
    source.put_shared(MODE, "agents.md", AGENTS_V2);
    assert!(matches!(engine(&project).run(&source, true).unwrap(), RunOutcome::Applied(_)));

    assert_eq!(project.read_config()["team"]["size"], 4);
}
