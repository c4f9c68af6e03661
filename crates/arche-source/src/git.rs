//! Content source backed by a local clone of the template repository.

use std::path::{Path, PathBuf};

use git2::{Commit, ErrorCode, ObjectType, Repository};
use tracing::debug;

use crate::source::{ContentSource, EntryKind, SourceEntry};
use crate::{Error, Result};

/// Reads template content straight from a git object database.
///
/// Branches are resolved as a local branch first, then `origin/<branch>`,
/// then a tag, then any revspec git understands. Nothing is checked out;
/// content is read from the resolved commit's tree.
#[derive(Debug, Clone)]
pub struct GitSource {
    path: PathBuf,
}

impl GitSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<Repository> {
        Repository::open(&self.path).map_err(|e| {
            if e.code() == ErrorCode::NotFound {
                Error::RepositoryNotFound {
                    path: self.path.clone(),
                }
            } else {
                Error::unavailable(format!("cannot open {}: {}", self.path.display(), e.message()))
            }
        })
    }

    fn resolve<'r>(repo: &'r Repository, branch: &str) -> Result<Commit<'r>> {
        let candidates = [
            format!("refs/heads/{branch}"),
            format!("refs/remotes/origin/{branch}"),
            format!("refs/tags/{branch}"),
        ];
        for name in &candidates {
            if let Ok(reference) = repo.find_reference(name) {
                return Ok(reference.peel_to_commit()?);
            }
        }

        repo.revparse_single(branch)
            .and_then(|object| object.peel_to_commit())
            .map_err(|_| Error::unavailable(format!("revision '{branch}' not found")))
    }
}

impl ContentSource for GitSource {
    fn latest_revision(&self, branch: &str) -> Result<String> {
        let repo = self.open()?;
        let commit = Self::resolve(&repo, branch)?;
        let revision = format!("{:.7}", commit.id());
        debug!(branch, %revision, "resolved template revision");
        Ok(revision)
    }

    fn fetch(&self, path: &str, branch: &str) -> Result<Option<Vec<u8>>> {
        let repo = self.open()?;
        let tree = Self::resolve(&repo, branch)?.tree()?;

        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if entry.kind() != Some(ObjectType::Blob) {
            return Ok(None);
        }

        let blob = entry.to_object(&repo)?.peel_to_blob()?;
        Ok(Some(blob.content().to_vec()))
    }

    fn list_dir(&self, path: &str, branch: &str) -> Result<Vec<SourceEntry>> {
        let repo = self.open()?;
        let root = Self::resolve(&repo, branch)?.tree()?;

        let trimmed = path.trim_matches('/');
        let tree = if trimmed.is_empty() {
            root
        } else {
            match root.get_path(Path::new(trimmed)) {
                Ok(entry) if entry.kind() == Some(ObjectType::Tree) => {
                    entry.to_object(&repo)?.peel_to_tree()?
                }
                Ok(_) => return Ok(Vec::new()),
                Err(e) if e.code() == ErrorCode::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(e.into()),
            }
        };

        let mut entries: Vec<SourceEntry> = tree
            .iter()
            .filter_map(|entry| {
                let kind = match entry.kind() {
                    Some(ObjectType::Blob) => EntryKind::File,
                    Some(ObjectType::Tree) => EntryKind::Dir,
                    _ => return None,
                };
                let name = entry.name()?.to_string();
                let path = if trimmed.is_empty() {
                    name.clone()
                } else {
                    format!("{trimmed}/{name}")
                };
                Some(SourceEntry { name, path, kind })
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
