//! [`TestProject`] builder for update scenarios.

use std::fs;
use std::path::Path;

use serde_json::{Value, json};
use tempfile::TempDir;

/// A temporary project root with helpers for seeding and asserting files.
///
/// # Example
///
/// ```rust,no_run
/// use arche_test_utils::project::TestProject;
///
/// let project = TestProject::new();
/// project.init_config("3-layer", "abc1234", "auto");
/// project.write("agents.md", "# Agents");
/// project.assert_file_contains(".arche-config", "abc1234");
/// ```
pub struct TestProject {
    temp_dir: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a `.arche-config` for `mode` (form `library`, branch `main`).
    pub fn init_config(&self, mode: &str, revision: &str, strategy: &str) {
        self.write_config(&json!({
            "update_strategy": strategy,
            "mode": mode,
            "form": "library",
            "arche_version": revision,
            "branch": "main",
            "telemetry_enabled": false,
        }));
    }

    pub fn write_config(&self, config: &Value) {
        self.write(".arche-config", &serde_json::to_string_pretty(config).unwrap());
    }

    /// Parse the current `.arche-config` as untyped JSON.
    pub fn read_config(&self) -> Value {
        serde_json::from_str(&self.read(".arche-config")).unwrap()
    }

    pub fn write(&self, path: &str, content: &str) {
        let full = self.root().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }

    /// # Panics
    /// Panics if the file cannot be read.
    pub fn read(&self, path: &str) -> String {
        let full = self.root().join(path);
        fs::read_to_string(&full)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full.display()))
    }

    pub fn exists(&self, path: &str) -> bool {
        self.root().join(path).exists()
    }

    /// Names of the snapshot directories under `.arche-backups`, sorted.
    pub fn backup_dirs(&self) -> Vec<String> {
        let dir = self.root().join(".arche-backups");
        let Ok(entries) = fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(full_path.exists(), "Expected file to exist: {}", full_path.display());
    }

    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, path: &str, content: &str) {
        let file_content = self.read(path);
        assert!(
            file_content.contains(content),
            "File {} does not contain expected content.\nExpected: {}\nActual: {}",
            path,
            content,
            file_content
        );
    }
}
