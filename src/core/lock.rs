//! core::lock
//!
//! Exclusive publish lock for a repository.
//!
//! # Architecture
//!
//! The deployment transaction uses a fixed staging directory and a fixed
//! worktree registration, so two publishes against the same working copy
//! would trample each other. The transaction itself does not serialize
//! callers; the CLI takes this lock around every `publish`.
//!
//! # Storage
//!
//! - `<git_dir>/ghpages.lock` - Lock file with OS-level exclusive lock
//!
//! # Invariants
//!
//! - Lock is automatically released on drop (RAII pattern)
//! - Lock acquisition is non-blocking (fails fast if locked)
//!
//! # Example
//!
//! ```ignore
//! use ghpages_deploy::core::lock::PublishLock;
//!
//! let lock = PublishLock::acquire(Path::new("/repo/.git"))?;
//! // ... run the deployment ...
//! drop(lock);
//! ```

use std::fs::{self, File, OpenOptions};
use std::path::Path;

use fs2::FileExt;
use thiserror::Error;

/// Lock file name inside the git directory.
pub const LOCK_FILE: &str = "ghpages.lock";

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process already holds the lock.
    #[error("another publish is already running against this repository")]
    AlreadyLocked,

    /// Failed to create lock file or directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),
}

/// An exclusive publish lock.
///
/// The lock is automatically released when this guard is dropped.
#[derive(Debug)]
pub struct PublishLock {
    file: File,
}

impl PublishLock {
    /// Attempt to acquire the publish lock in `git_dir`.
    ///
    /// # Errors
    ///
    /// - [`LockError::AlreadyLocked`] if another process holds the lock
    /// - [`LockError::CreateFailed`] if the lock file cannot be created
    /// - [`LockError::AcquireFailed`] if the OS lock cannot be acquired
    pub fn acquire(git_dir: &Path) -> Result<Self, LockError> {
        fs::create_dir_all(git_dir).map_err(|e| {
            LockError::CreateFailed(format!("cannot create {}: {}", git_dir.display(), e))
        })?;

        let path = git_dir.join(LOCK_FILE);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "acquired publish lock");
                Ok(Self { file })
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(LockError::AlreadyLocked),
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }
}

impl Drop for PublishLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn acquire_creates_lock_file() {
        let temp = TempDir::new().unwrap();
        let _lock = PublishLock::acquire(temp.path()).expect("acquire lock");
        assert!(temp.path().join(LOCK_FILE).is_file());
    }

    #[test]
    fn acquire_creates_missing_git_dir() {
        let temp = TempDir::new().unwrap();
        let git_dir = temp.path().join("nested/.git");
        let _lock = PublishLock::acquire(&git_dir).expect("acquire lock");
        assert!(git_dir.join(LOCK_FILE).is_file());
    }

    #[test]
    fn second_acquire_fails() {
        let temp = TempDir::new().unwrap();
        let _lock = PublishLock::acquire(temp.path()).expect("first acquire");

        let result = PublishLock::acquire(temp.path());
        assert!(matches!(result, Err(LockError::AlreadyLocked)));
    }

    #[test]
    fn released_on_drop() {
        let temp = TempDir::new().unwrap();
        let lock = PublishLock::acquire(temp.path()).expect("first acquire");
        drop(lock);

        PublishLock::acquire(temp.path()).expect("second acquire");
    }
}
