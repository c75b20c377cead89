//! Rescan guard.
//!
//! Only one rescan per cache directory and mode runs at a time. The guard is a
//! non-blocking exclusive lock on a file next to the cache entries; the lock
//! is released when the [`RescanLock`] is dropped or the process exits.

use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::{cache::Cache, config::Mode};

/// Holds the exclusive rescan lock until dropped.
#[derive(Debug)]
pub struct RescanLock {
    file: File,
    path: PathBuf,
}

impl RescanLock {
    /// Lock file used for `mode` in `cache`.
    #[must_use]
    pub fn path_for(cache: &Cache, mode: Mode) -> PathBuf {
        cache.path(&format!("{}-rescan.lock", mode.cache_prefix()))
    }

    /// Try to take the lock without waiting.
    ///
    /// Returns `Ok(None)` if another process already holds it.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be created or opened.
    pub fn try_acquire(path: &Path) -> Result<Option<Self>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open lock file: {}", path.display()))?;

        match file.try_lock_exclusive() {
            Ok(true) => Ok(Some(Self {
                file,
                path: path.to_path_buf(),
            })),
            Ok(false) => Ok(None),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to lock {}", path.display())),
        }
    }

    /// Whether some process currently holds the lock at `path`.
    ///
    /// A missing lock file means nobody holds it.
    #[must_use]
    pub fn is_held(path: &Path) -> bool {
        if !path.exists() {
            return false;
        }
        matches!(Self::try_acquire(path), Ok(None))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RescanLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
