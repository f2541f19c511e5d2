// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exclusive ownership of a queue database across processes.
//!
//! The queue store serializes transitions within one process only. Every
//! process that restores a store from the database must hold a [`SiteLock`]
//! until it has persisted its last event, so `serve` and the one-shot
//! commands never work from the same history at the same time.

use std::fs::{File, OpenOptions, TryLockError};
use std::io::Write;
use std::path::{Path, PathBuf};

use kiosk_core::KioskError;
use tracing::debug;

/// An advisory lock on `<database_path>.lock`, released on drop.
#[derive(Debug)]
pub struct SiteLock {
    path: PathBuf,
    _file: Option<File>,
}

impl SiteLock {
    /// Take the lock without waiting.
    ///
    /// Fails with [`KioskError::InUse`] when another process holds it. An
    /// in-memory database has nothing to share and is never locked.
    pub fn acquire(database_path: &str) -> Result<Self, KioskError> {
        if database_path == ":memory:" {
            return Ok(Self {
                path: PathBuf::new(),
                _file: None,
            });
        }

        let path = lock_path(database_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(io_err)?;

        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => {
                return Err(KioskError::InUse {
                    path: database_path.to_string(),
                });
            }
            Err(TryLockError::Error(e)) => return Err(io_err(e)),
        }

        // Owner pid, for whoever finds the lock file while debugging.
        file.set_len(0).map_err(io_err)?;
        writeln!(file, "{}", std::process::id()).map_err(io_err)?;

        debug!(path = %path.display(), "queue database locked");
        Ok(Self {
            path,
            _file: Some(file),
        })
    }

    /// The lock file, empty for an in-memory database.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn lock_path(database_path: &str) -> PathBuf {
    PathBuf::from(format!("{database_path}.lock"))
}

fn io_err(e: std::io::Error) -> KioskError {
    KioskError::Storage {
        source: Box::new(e),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn second_holder_is_rejected_until_release() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("kiosk.db");
        let db = db.to_str().unwrap();

        let first = SiteLock::acquire(db).unwrap();
        assert!(first.path().ends_with("kiosk.db.lock"));

        let err = SiteLock::acquire(db).unwrap_err();
        assert!(matches!(err, KioskError::InUse { .. }));
        assert!(err.is_user_facing());

        drop(first);
        assert!(SiteLock::acquire(db).is_ok());
    }

    #[test]
    fn lock_file_records_owner_pid() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("nested").join("kiosk.db");
        let lock = SiteLock::acquire(db.to_str().unwrap()).unwrap();
        let contents = std::fs::read_to_string(lock.path()).unwrap();
        assert_eq!(contents.trim(), std::process::id().to_string());
    }

    #[test]
    fn memory_databases_are_not_locked() {
        let a = SiteLock::acquire(":memory:").unwrap();
        let b = SiteLock::acquire(":memory:").unwrap();
        assert_eq!(a.path(), Path::new(""));
        assert_eq!(b.path(), Path::new(""));
    }
}
