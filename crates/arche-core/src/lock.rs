//! Advisory project lock
//!
//! `apply` and `rollback` hold an exclusive lock on `.arche.lock` so two
//! processes cannot interleave backups and writes in the same project.

use std::fs::{File, OpenOptions};

use arche_fs::ProjectLayout;
use fs2::FileExt;
use tracing::debug;

use crate::{Error, Result};

/// Held for as long as the value lives; released on drop.
#[derive(Debug)]
pub struct ProjectLock {
    file: File,
}

impl ProjectLock {
    /// Try to take the lock without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Locked`] if another process holds the lock.
    pub fn acquire(layout: &ProjectLayout) -> Result<Self> {
        let path = layout.lock_path().to_native();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| arche_fs::Error::io(&path, e))?;

        if let Err(e) = file.try_lock_exclusive() {
            let contended = e.kind() == std::io::ErrorKind::WouldBlock
                || e.raw_os_error() == fs2::lock_contended_error().raw_os_error();
            return Err(if contended {
                Error::Locked { path }
            } else {
                arche_fs::Error::io(&path, e).into()
            });
        }

        debug!(path = %path.display(), "acquired project lock");
        Ok(Self { file })
    }
}

impl Drop for ProjectLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
