//! Template repository fixtures built with `git2`.

use std::fs;
use std::path::Path;

use arche_source::GitSource;
use git2::{IndexAddOption, Repository, RepositoryInitOptions, Signature};
use tempfile::TempDir;

/// A real git repository laid out like an Arche template repository.
///
/// The repository starts on branch `main` with no commits.
///
/// # Example
///
/// ```rust,no_run
/// use arche_test_utils::git::TemplateRepo;
///
/// let template = TemplateRepo::new();
/// let rev = template.commit(&[("modes/3-layer/_shared/agents.md", "# Agents")]);
/// assert_eq!(rev.len(), 7);
/// ```
pub struct TemplateRepo {
    dir: TempDir,
    repo: Repository,
}

impl Default for TemplateRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRepo {
    /// # Panics
    /// Panics if the repository cannot be initialised.
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(dir.path(), &opts)
            .unwrap_or_else(|e| panic!("TemplateRepo: failed to init repository: {e}"));
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// A [`GitSource`] reading this repository.
    pub fn source(&self) -> GitSource {
        GitSource::new(self.path())
    }

    /// Write `files` into the work tree and commit them on the current branch.
    ///
    /// Returns the abbreviated id of the new commit.
    ///
    /// # Panics
    /// Panics if any filesystem or git operation fails.
    pub fn commit(&self, files: &[(&str, &str)]) -> String {
        for (path, content) in files {
            let full = self.path().join(path);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&full, content)
                .unwrap_or_else(|e| panic!("TemplateRepo: failed to write {path}: {e}"));
        }
        self.commit_index("update templates")
    }

    /// Remove `paths` from the work tree and commit the deletion.
    ///
    /// # Panics
    /// Panics if any filesystem or git operation fails.
    pub fn remove(&self, paths: &[&str]) -> String {
        for path in paths {
            fs::remove_file(self.path().join(path))
                .unwrap_or_else(|e| panic!("TemplateRepo: failed to remove {path}: {e}"));
        }
        self.commit_index("remove templates")
    }

    /// Create a tag named `name` at the current HEAD.
    ///
    /// # Panics
    /// Panics if HEAD does not exist.
    pub fn tag(&self, name: &str) {
        let head = self.repo.head().unwrap().peel_to_commit().unwrap();
        self.repo
            .tag_lightweight(name, head.as_object(), false)
            .unwrap();
    }

    fn commit_index(&self, message: &str) -> String {
        let mut index = self.repo.index().unwrap();
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .unwrap();
        index
            .update_all(["*"].iter(), None)
            .unwrap();
        index.write().unwrap();

        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::now("Test User", "test@example.com").unwrap();
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap_or_else(|e| panic!("TemplateRepo: commit failed: {e}"));
        format!("{:.7}", oid)
    }
}

/// Files of a minimal `3-layer` mode with a `library` form.
pub fn sample_template() -> Vec<(&'static str, &'static str)> {
    vec![
        ("modes/3-layer/_shared/agents.md", "# Agents\n\nShared agent guidance.\n"),
        ("modes/3-layer/_shared/INSTRUCTIONS.md", "# Instructions\n"),
        ("modes/3-layer/_shared/init_env.md", "# Environment\n"),
        (
            "modes/3-layer/forms/library/project.json",
            concat!(
                r#"{"name": "Library", "description": "A reusable package", "#,
                r#""directories": ["src", "tests"], "languages": ["python"]}"#,
            ),
        ),
        ("modes/3-layer/forms/library/setup.py", "from setuptools import setup\n"),
        ("modes/3-layer/forms/library/tests/test_package.py", "def test_ok():\n    assert True\n"),
        (
            "modes/3-layer/forms/cli-tool/project.json",
            r#"{"name": "CLI Tool", "directories": []}"#,
        ),
    ]
}
