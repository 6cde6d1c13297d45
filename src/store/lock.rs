//! store::lock
//!
//! Exclusive lock guarding commits to a file-backed store.
//!
//! # Storage
//!
//! - `<store file>.lock` - Lock file with OS-level exclusive lock
//!
//! # Invariants
//!
//! - Lock is held for the whole read-apply-write cycle of a commit
//! - Lock is automatically released on drop (RAII pattern)
//! - Lock acquisition is non-blocking (fails fast if locked)

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process already holds the lock.
    #[error("store is locked by another process")]
    AlreadyLocked,

    /// Failed to create lock file or directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),
}

/// An exclusive lock on a store file.
///
/// The lock is released when this guard is dropped, even if the commit
/// panics.
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
    /// When this is Some, we hold the lock.
    file: Option<File>,
}

impl StoreLock {
    /// Lock file path for a store file.
    pub fn lock_path(store_path: &Path) -> PathBuf {
        let mut name = store_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        store_path.with_file_name(name)
    }

    /// Attempt to acquire the lock for `store_path`.
    ///
    /// # Errors
    ///
    /// - [`LockError::AlreadyLocked`] if another handle holds the lock
    /// - [`LockError::CreateFailed`] if the lock file cannot be created
    /// - [`LockError::AcquireFailed`] if the OS lock cannot be acquired
    pub fn acquire(store_path: &Path) -> Result<Self, LockError> {
        if let Some(dir) = store_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| {
                LockError::CreateFailed(format!("cannot create {}: {}", dir.display(), e))
            })?;
        }

        let path = Self::lock_path(store_path);
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
            Ok(()) => Ok(Self {
                path,
                file: Some(file),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(LockError::AlreadyLocked),
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    /// Check if the lock is currently held.
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Get the path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lock_path_appends_suffix() {
        assert_eq!(
            StoreLock::lock_path(Path::new("/data/store.json")),
            PathBuf::from("/data/store.json.lock")
        );
    }

    #[test]
    fn lock_acquire_succeeds() {
        let temp = TempDir::new().unwrap();
        let lock = StoreLock::acquire(&temp.path().join("store.json")).unwrap();
        assert!(lock.is_held());
        assert!(lock.path().exists());
    }

    #[test]
    fn lock_creates_parent_directory() {
        let temp = TempDir::new().unwrap();
        let store = temp.path().join("nested/dir/store.json");
        let _lock = StoreLock::acquire(&store).unwrap();
        assert!(store.parent().unwrap().exists());
    }

    #[test]
    fn lock_prevents_second_acquire() {
        let temp = TempDir::new().unwrap();
        let store = temp.path().join("store.json");
        let _first = StoreLock::acquire(&store).unwrap();
        assert!(matches!(
            StoreLock::acquire(&store),
            Err(LockError::AlreadyLocked)
        ));
    }

    #[test]
    fn lock_released_on_drop() {
        let temp = TempDir::new().unwrap();
        let store = temp.path().join("store.json");
        {
            let _lock = StoreLock::acquire(&store).unwrap();
        }
        assert!(StoreLock::acquire(&store).unwrap().is_held());
    }
}
