//! Exclusive batch edit lock.
//!
//! A run holds this lock from start to finish so that no other run edits
//! the destination tree at the same time. The lock is an OS file lock
//! (`flock`/`LockFileEx`) on a file beside the package directory, so it is
//! released on every exit path including a crash.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, info};

use crate::error::ImportError;

/// Held exclusive lock; released on drop.
#[derive(Debug)]
pub struct BatchEditLock {
    /// Kept open to maintain the lock.
    file: File,
    path: PathBuf,
}

impl BatchEditLock {
    /// Take the lock without blocking.
    ///
    /// Fails with [`ImportError::LockBusy`] when another run holds it.
    pub fn try_acquire(path: impl AsRef<Path>) -> Result<Self, ImportError> {
        let path = path.as_ref().to_path_buf();
        let lock_err = |e: std::io::Error| ImportError::Lock {
            path: path.clone(),
            source: e,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(lock_err)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(lock_err)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                info!(path = %path.display(), "Acquired batch edit lock");
                Ok(Self { file, path })
            }
            Err(e) if is_contended(&e) => {
                debug!(path = %path.display(), "Batch edit lock already held");
                Err(ImportError::LockBusy { path })
            }
            Err(e) => Err(ImportError::Lock { path, source: e }),
        }
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn is_contended(e: &std::io::Error) -> bool {
    e.kind() == std::io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

impl Drop for BatchEditLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        info!(path = %self.path.display(), "Released batch edit lock");
    }
}
