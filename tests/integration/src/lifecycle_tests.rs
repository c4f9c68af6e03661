//! Project lifecycle against a real template repository
//!
//! bootstrap -> upstream change -> check -> diff -> apply -> rollback, with
//! the git-backed source throughout.

use arche_core::{
    BootstrapOptions, CheckOutcome, Error, ProjectLock, RunOutcome, UpdateEngine,
    initialize_project,
};
use arche_fs::{FileStatus, ProjectLayout, TRACKED_FILES, fingerprint};
use arche_source::ContentSource;
use arche_test_utils::git::{TemplateRepo, sample_template};
use arche_test_utils::project::TestProject;
use pretty_assertions::assert_eq;

struct Fixture {
    template: TemplateRepo,
    project: TestProject,
    initial: String,
}

fn bootstrap(strategy: &str) -> Fixture {
    let template = TemplateRepo::new();
    let initial = template.commit(&sample_template());
    let project = TestProject::new();

    let mut options = BootstrapOptions::new("3-layer", "library", project.root());
    options.strategy = strategy.parse().unwrap();
    options.telemetry = Some(false);
    initialize_project(&template.source(), &options).unwrap();

    Fixture {
        template,
        project,
        initial,
    }
}

fn tracked_fingerprints(project: &TestProject) -> Vec<String> {
    TRACKED_FILES
        .iter()
        .chain([".arche-config"].iter())
        .map(|f| fingerprint(project.read(f).as_bytes()).to_string())
        .collect()
}

#[test]
fn full_update_cycle() {
    let fx = bootstrap("manual");
    let source = fx.template.source();
    let engine = UpdateEngine::new(fx.project.root());
    let before = tracked_fingerprints(&fx.project);

    assert_eq!(
        engine.check(&source).unwrap(),
        CheckOutcome::UpToDate {
            revision: fx.initial.clone()
        }
    );

    let next = fx.template.commit(&[
        ("modes/3-layer/_shared/agents.md", "# Agents\n\nRevised.\n"),
        ("modes/3-layer/_shared/init_env.md", "# Environment\n"),
        ("modes/3-layer/forms/library/setup.py", "# form files are not tracked\n"),
    ]);

    let diff = engine.diff(&source).unwrap();
    let statuses: Vec<_> = diff.entries.iter().map(|e| (e.file.as_str(), e.status)).collect();
    assert_eq!(
        statuses,
        vec![
            ("agents.md", FileStatus::Modified),
            ("INSTRUCTIONS.md", FileStatus::Unchanged),
            ("init_env.md", FileStatus::Unchanged),
        ]
    );

    let RunOutcome::Applied(applied) = engine.run(&source, true).unwrap() else {
        panic!("expected apply");
    };
    assert_eq!(applied.written, vec!["agents.md".to_string()]);
    assert_eq!(applied.revision, next);
    assert_eq!(fx.project.read("agents.md"), "# Agents\n\nRevised.\n");
    assert_eq!(fx.project.read("setup.py"), "from setuptools import setup\n");
    assert!(!engine.check(&source).unwrap().has_updates());

    let entry = engine.history().last().unwrap().unwrap();
    assert_eq!(entry.revision, next);
    assert_eq!(entry.file_count, 1);

    let snapshot = applied.snapshot.unwrap();
    engine.rollback(snapshot.as_str()).unwrap();
    assert_eq!(tracked_fingerprints(&fx.project), before);
    assert_eq!(engine.config().unwrap().revision, fx.initial);
}

#[test]
fn locally_deleted_file_is_restored_as_new() {
    let fx = bootstrap("manual");
    let source = fx.template.source();
    let engine = UpdateEngine::new(fx.project.root());
    std::fs::remove_file(fx.project.root().join("INSTRUCTIONS.md")).unwrap();
    fx.template.commit(&[("modes/3-layer/_shared/agents.md", "# Agents v2\n")]);

    let CheckOutcome::UpdatesAvailable(pending) = engine.check(&source).unwrap() else {
        panic!("expected updates");
    };
    let statuses: Vec<_> = pending.files.iter().map(|f| (f.name.as_str(), f.status)).collect();
    assert_eq!(
        statuses,
        vec![
            ("agents.md", FileStatus::Modified),
            ("INSTRUCTIONS.md", FileStatus::New),
        ]
    );

    engine.apply(&pending).unwrap();
    fx.project.assert_file_contains("INSTRUCTIONS.md", "# Instructions");
}

#[test]
fn file_removed_upstream_is_left_alone() {
    let fx = bootstrap("auto");
    let source = fx.template.source();
    let engine = UpdateEngine::new(fx.project.root());
    fx.template.remove(&["modes/3-layer/_shared/init_env.md"]);
    fx.template.commit(&[("modes/3-layer/_shared/agents.md", "# Agents v2\n")]);

    let RunOutcome::Applied(applied) = engine.run(&source, false).unwrap() else {
        panic!("expected apply");
    };

    assert_eq!(applied.written, vec!["agents.md".to_string()]);
    fx.project.assert_file_contains("init_env.md", "# Environment");
}

#[test]
fn tagged_release_as_branch() {
    let fx = bootstrap("manual");
    let source = fx.template.source();
    fx.template.tag("v1.0.0");
    let tagged = source.latest_revision("v1.0.0").unwrap();
    fx.template.commit(&[("modes/3-layer/_shared/agents.md", "# unreleased\n")]);

    let mut config = fx.project.read_config();
    config["branch"] = serde_json::json!("v1.0.0");
    fx.project.write_config(&config);

    let engine = UpdateEngine::new(fx.project.root());
    assert_eq!(tagged, fx.initial);
    assert_eq!(
        engine.check(&source).unwrap(),
        CheckOutcome::UpToDate { revision: tagged }
    );
}

#[test]
fn concurrent_apply_is_refused() {
    let fx = bootstrap("manual");
    let source = fx.template.source();
    let engine = UpdateEngine::new(fx.project.root());
    fx.template.commit(&[("modes/3-layer/_shared/agents.md", "# Agents v2\n")]);
    let CheckOutcome::UpdatesAvailable(pending) = engine.check(&source).unwrap() else {
        panic!("expected updates");
    };

    let held = ProjectLock::acquire(&ProjectLayout::new(fx.project.root())).unwrap();
    let err = engine.apply(&pending).unwrap_err();
    assert!(matches!(err, Error::Locked { .. }), "got: {err}");
    assert!(fx.project.backup_dirs().is_empty());

    drop(held);
    engine.apply(&pending).unwrap();
    assert_eq!(fx.project.backup_dirs().len(), 1);
}
