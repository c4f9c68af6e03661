//! In-memory content source with call accounting.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use arche_source::{ContentSource, EntryKind, Error, Result, SourceEntry, shared_path};

/// A [`ContentSource`] whose branches and files live in memory.
///
/// Every trait call is counted, so tests can assert that an operation did or
/// did not touch the source. [`MemorySource::go_offline`] makes every call
/// fail with [`Error::Unavailable`].
#[derive(Debug, Default)]
pub struct MemorySource {
    revisions: RefCell<BTreeMap<String, String>>,
    files: RefCell<BTreeMap<(String, String), Vec<u8>>>,
    offline: Cell<bool>,
    revision_calls: Cell<usize>,
    fetch_calls: Cell<usize>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source whose `main` branch is at `revision`.
    pub fn at_revision(revision: &str) -> Self {
        let source = Self::new();
        source.set_revision("main", revision);
        source
    }

    pub fn set_revision(&self, branch: &str, revision: &str) {
        self.revisions
            .borrow_mut()
            .insert(branch.to_string(), revision.to_string());
    }

    pub fn put(&self, branch: &str, path: &str, content: impl AsRef<[u8]>) {
        self.files.borrow_mut().insert(
            (branch.to_string(), path.to_string()),
            content.as_ref().to_vec(),
        );
    }

    /// Put a shared file of `mode` on `main`.
    pub fn put_shared(&self, mode: &str, filename: &str, content: impl AsRef<[u8]>) {
        self.put("main", &shared_path(mode, filename), content);
    }

    pub fn remove(&self, branch: &str, path: &str) {
        self.files
            .borrow_mut()
            .remove(&(branch.to_string(), path.to_string()));
    }

    pub fn go_offline(&self) {
        self.offline.set(true);
    }

    pub fn go_online(&self) {
        self.offline.set(false);
    }

    pub fn revision_calls(&self) -> usize {
        self.revision_calls.get()
    }

    /// Calls to `fetch` and `list_dir` combined.
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.get()
    }

    /// Total number of calls of any kind.
    pub fn calls(&self) -> usize {
        self.revision_calls() + self.fetch_calls()
    }

    fn ensure_online(&self) -> Result<()> {
        if self.offline.get() {
            Err(Error::unavailable("memory source is offline"))
        } else {
            Ok(())
        }
    }
}

impl ContentSource for MemorySource {
    fn latest_revision(&self, branch: &str) -> Result<String> {
        self.revision_calls.set(self.revision_calls.get() + 1);
        self.ensure_online()?;
        self.revisions
            .borrow()
            .get(branch)
            .cloned()
            .ok_or_else(|| Error::unavailable(format!("revision '{branch}' not found")))
    }

    fn fetch(&self, path: &str, branch: &str) -> Result<Option<Vec<u8>>> {
        self.fetch_calls.set(self.fetch_calls.get() + 1);
        self.ensure_online()?;
        Ok(self
            .files
            .borrow()
            .get(&(branch.to_string(), path.to_string()))
            .cloned())
    }

    fn list_dir(&self, path: &str, branch: &str) -> Result<Vec<SourceEntry>> {
        self.fetch_calls.set(self.fetch_calls.get() + 1);
        self.ensure_online()?;

        let dir = path.trim_matches('/');
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };

        let mut seen = BTreeSet::new();
        let mut entries = Vec::new();
        for (file_branch, file_path) in self.files.borrow().keys() {
            if file_branch != branch {
                continue;
            }
            let Some(rest) = file_path.strip_prefix(&prefix) else {
                continue;
            };
            let (name, kind) = match rest.split_once('/') {
                Some((dir_name, _)) => (dir_name, EntryKind::Dir),
                None => (rest, EntryKind::File),
            };
            if seen.insert(name.to_string()) {
                entries.push(SourceEntry {
                    name: name.to_string(),
                    path: format!("{prefix}{name}"),
                    kind,
                });
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
