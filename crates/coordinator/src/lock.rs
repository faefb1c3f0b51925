// SPDX-License-Identifier: MIT

//! Single-writer leader lock: exactly one coordinator process is active at
//! a time, enforced by a cluster-wide lock acquired at startup.
//!
//! The real cluster coordination service is an external collaborator; this
//! crate stands that contract up locally with an exclusive file lock, the
//! same pattern used for a single-instance PID file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::RuntimeError;

/// A handle whose existence proves this process holds the leader lock.
/// Losing the lock is fatal; dropping the handle releases it.
pub trait LeaderLock: Send + Sync + 'static {}

/// Exclusive-lock a PID file at `path`. Fails if another process already
/// holds it.
pub struct FileLeaderLock {
    _file: File,
    path: PathBuf,
}

impl FileLeaderLock {
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self, RuntimeError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(RuntimeError::Io)?;
        }
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(RuntimeError::LockFailed)?;
        file.try_lock_exclusive().map_err(RuntimeError::LockFailed)?;
        file.set_len(0).map_err(RuntimeError::Io)?;
        writeln!(file, "{}", std::process::id()).map_err(RuntimeError::Io)?;
        Ok(Self { _file: file, path })
    }
}

impl LeaderLock for FileLeaderLock {}

impl Drop for FileLeaderLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
