//! Exclusive lock on the domain store
//!
//! Tables are loaded once when `Storage` opens and each commit rewrites the
//! whole table file, so at most one `Storage` may have a given data
//! directory open. The lock is an advisory `flock` on `.simulotto.lock`
//! inside the data directory, held until the guard is dropped.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use crate::error::{SimulottoError, SimulottoResult};

const LOCK_FILE: &str = ".simulotto.lock";

/// Holds the data directory lock; released on drop
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Lock `data_dir`, failing at once if another `Storage` holds it
    pub fn acquire(data_dir: &Path) -> SimulottoResult<Self> {
        let path = data_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| {
                SimulottoError::Storage(format!("Failed to open {}: {}", path.display(), e))
            })?;

        file.try_lock_exclusive().map_err(|e| {
            SimulottoError::Storage(format!(
                "domain store {} is in use by another process ({})",
                data_dir.display(),
                e
            ))
        })?;

        debug!(path = %path.display(), "locked domain store");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        // The lock file itself is left in place for the next opener
        let _ = FileExt::unlock(&self.file);
    }
}
