//! Project bootstrap from a mode/form template
//!
//! Copies `modes/<mode>/_shared/` and `modes/<mode>/forms/<form>/` from the
//! content source into a target directory, creates the directories the
//! form's `project.json` asks for, and writes the `.arche-config` provenance
//! record that later updates read.

use std::fs;
use std::path::PathBuf;

use arche_fs::{ArchePath, NormalizedPath, ProjectLayout, io, validate_relative_path};
use arche_source::{
    ContentSource, EntryKind, MANIFEST_FILE, form_dir, forms_dir, manifest_path, shared_dir,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::{ConfigStore, DEFAULT_BRANCH, GlobalConfig, ProjectConfig, UpdateStrategy};
use crate::update::policy;
use crate::{Error, Result};

/// Root of the mode tree in a template repository
const MODES_DIR: &str = "modes";

/// Contents of a form's `project.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Directories to create in the new project
    #[serde(default)]
    pub directories: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
}

impl FormManifest {
    pub fn uses_language(&self, language: &str) -> bool {
        self.languages.iter().any(|l| l.eq_ignore_ascii_case(language))
    }
}

/// Options for [`initialize_project`]
#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    pub mode: String,
    pub form: String,
    pub target: PathBuf,
    pub branch: String,
    pub strategy: UpdateStrategy,
    /// Check interval for the `prompt` strategy
    pub interval: Option<u32>,
    /// `None` defers to the global config, then to enabled
    pub telemetry: Option<bool>,
    /// Re-initialize a directory that already has `.arche-config`
    pub force: bool,
}

impl BootstrapOptions {
    pub fn new(
        mode: impl Into<String>,
        form: impl Into<String>,
        target: impl Into<PathBuf>,
    ) -> Self {
        Self {
            mode: mode.into(),
            form: form.into(),
            target: target.into(),
            branch: DEFAULT_BRANCH.to_string(),
            strategy: UpdateStrategy::default(),
            interval: None,
            telemetry: None,
            force: false,
        }
    }
}

/// What [`initialize_project`] did
#[derive(Debug, Clone)]
pub struct BootstrapReport {
    pub manifest: FormManifest,
    /// Copied files, relative to the target
    pub files: Vec<String>,
    pub directories: Vec<String>,
    pub config: ProjectConfig,
    pub telemetry: bool,
}

/// Resolve the telemetry setting: explicit choice, then global config, then on.
pub fn resolve_telemetry(explicit: Option<bool>, global: &GlobalConfig) -> bool {
    explicit.or(global.telemetry_enabled).unwrap_or(true)
}

/// Bootstrap a project from `options.mode` / `options.form`.
///
/// # Errors
///
/// - [`Error::AlreadyInitialized`] if the target has a config and `force` is unset
/// - [`Error::TemplateNotFound`] if the form has no readable `project.json`
/// - [`Error::InvalidInterval`] for a zero `prompt` interval
/// - [`Error::NetworkUnavailable`] if the source cannot be read
pub fn initialize_project(
    source: &dyn ContentSource,
    options: &BootstrapOptions,
) -> Result<BootstrapReport> {
    let layout = ProjectLayout::new(&options.target);
    let store = ConfigStore::new(&layout);
    if layout.is_initialized() && !options.force {
        return Err(Error::AlreadyInitialized {
            path: options.target.clone(),
        });
    }
    if let Some(0) = options.interval {
        return Err(Error::InvalidInterval { days: 0 });
    }

    let manifest = fetch_manifest(source, &options.mode, &options.form, &options.branch)?;
    info!(
        mode = %options.mode,
        form = %options.form,
        branch = %options.branch,
        target = %options.target.display(),
        "initializing project"
    );

    fs::create_dir_all(&options.target).map_err(|e| arche_fs::Error::io(&options.target, e))?;
    let root = layout.root();

    let mut files = Vec::new();
    copy_tree(source, &shared_dir(&options.mode), root, "", &options.branch, &mut files)?;
    copy_tree(
        source,
        &form_dir(&options.mode, &options.form),
        root,
        "",
        &options.branch,
        &mut files,
    )?;

    let mut directories = Vec::new();
    for dir in &manifest.directories {
        let dir = dir.trim_end_matches('/');
        validate_relative_path(dir)?;
        let path = layout.file(dir);
        fs::create_dir_all(path.as_ref()).map_err(|e| arche_fs::Error::io(path.to_native(), e))?;
        debug!(dir, "created directory");
        directories.push(dir.to_string());
    }

    let telemetry = match options.telemetry {
        Some(explicit) => explicit,
        None => resolve_telemetry(None, &GlobalConfig::load()),
    };
    let today = Local::now().date_naive();
    if telemetry {
        let record = json!({
            "telemetry_enabled": true,
            "mode": options.mode,
            "form": options.form,
            "project_type": null,
            "team_size": null,
            "created_at": today.format("%Y-%m-%d").to_string(),
            "arche_version": options.branch,
            "notes": "This file is never committed. It helps the arche community understand usage \
                      patterns. To disable: set telemetry_enabled to false or delete this file.",
        });
        io::write_atomic(
            &layout.path(ArchePath::Telemetry),
            serde_json::to_string_pretty(&record)?.as_bytes(),
        )?;
    }

    let revision = match source.latest_revision(&options.branch) {
        Ok(revision) => revision,
        Err(e) if e.is_unavailable() => {
            warn!(
                branch = %options.branch,
                error = %e,
                "revision unavailable; recording branch name"
            );
            options.branch.clone()
        }
        Err(e) => return Err(e.into()),
    };

    let mut config = ProjectConfig::new(&options.mode, &options.form, revision);
    config.branch = options.branch.clone();
    config.created_at = Some(today);
    config.telemetry_enabled = Some(telemetry);
    policy::apply_strategy(&mut config, options.strategy, options.interval)?;
    if config.strategy == UpdateStrategy::Prompt {
        config.last_check = Some(today);
    }
    store.save(&config)?;

    let mut ignored = vec![
        ArchePath::Config.as_str(),
        ".arche-backups/",
        ArchePath::UpdateLog.as_str(),
        ArchePath::Lock.as_str(),
    ];
    if telemetry {
        ignored.insert(0, ArchePath::Telemetry.as_str());
    }
    ensure_ignored(&layout.path(ArchePath::GitIgnore), &ignored)?;

    info!(
        files = files.len(),
        directories = directories.len(),
        revision = %config.revision,
        "project initialized"
    );
    Ok(BootstrapReport {
        manifest,
        files,
        directories,
        config,
        telemetry,
    })
}

fn fetch_manifest(
    source: &dyn ContentSource,
    mode: &str,
    form: &str,
    branch: &str,
) -> Result<FormManifest> {
    let not_found = || Error::TemplateNotFound {
        mode: mode.to_string(),
        form: form.to_string(),
    };

    let raw = source
        .fetch(&manifest_path(mode, form), branch)?
        .ok_or_else(not_found)?;
    serde_json::from_slice(&raw).map_err(|e| {
        warn!(mode, form, error = %e, "unreadable project.json");
        not_found()
    })
}

/// Copy the remote directory `remote_dir` into `target/prefix`, skipping
/// form manifests at any depth.
fn copy_tree(
    source: &dyn ContentSource,
    remote_dir: &str,
    target: &NormalizedPath,
    prefix: &str,
    branch: &str,
    files: &mut Vec<String>,
) -> Result<()> {
    for entry in source.list_dir(remote_dir, branch)? {
        if entry.name == MANIFEST_FILE {
            continue;
        }
        let relative = if prefix.is_empty() {
            entry.name.clone()
        } else {
            format!("{prefix}/{}", entry.name)
        };
        validate_relative_path(&relative)?;

        match entry.kind {
            EntryKind::File => {
                let Some(content) = source.fetch(&entry.path, branch)? else {
                    continue;
                };
                io::write_atomic(&target.join(&relative), &content)?;
                debug!(file = %relative, "copied");
                files.push(relative);
            }
            EntryKind::Dir => {
                let dir = target.join(&relative);
                fs::create_dir_all(dir.as_ref())
                    .map_err(|e| arche_fs::Error::io(dir.to_native(), e))?;
                copy_tree(source, &entry.path, target, &relative, branch, files)?;
            }
        }
    }
    Ok(())
}

/// Append each of `entries` not already listed to the `.gitignore` at `path`.
fn ensure_ignored(path: &NormalizedPath, entries: &[&str]) -> Result<()> {
    let existing = match io::read_optional(path)? {
        Some(raw) => String::from_utf8_lossy(&raw).into_owned(),
        None => String::new(),
    };

    let missing: Vec<&str> = entries
        .iter()
        .copied()
        .filter(|entry| !existing.lines().any(|line| line.trim() == *entry))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }

    let mut content = existing.trim_end().to_string();
    if !content.is_empty() {
        content.push('\n');
    }
    for entry in missing {
        content.push_str(entry);
        content.push('\n');
    }
    io::write_atomic(path, content.as_bytes())?;
    Ok(())
}

fn list_visible_dirs(source: &dyn ContentSource, path: &str, branch: &str) -> Result<Vec<String>> {
    Ok(source
        .list_dir(path, branch)?
        .into_iter()
        .filter(|entry| entry.kind == EntryKind::Dir)
        .filter(|entry| !entry.name.starts_with('.') && !entry.name.starts_with('_'))
        .map(|entry| entry.name)
        .collect())
}

/// Modes available in the template repository.
pub fn list_modes(source: &dyn ContentSource, branch: &str) -> Result<Vec<String>> {
    list_visible_dirs(source, MODES_DIR, branch)
}

/// Forms available for `mode`.
pub fn list_forms(source: &dyn ContentSource, mode: &str, branch: &str) -> Result<Vec<String>> {
    list_visible_dirs(source, &forms_dir(mode), branch)
}
