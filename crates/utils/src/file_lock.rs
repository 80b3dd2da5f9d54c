//! Advisory file locks guarding writes to a storage root

use fs2::FileExt;
use regstore_core::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// An exclusive advisory lock held on a lock file until dropped.
///
/// The lock file itself is left in place; removing it would let a waiter lock
/// an unlinked inode while a newcomer locks a fresh one.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Block until an exclusive lock on `path` is acquired
    pub fn exclusive(path: &Path) -> Result<Self> {
        let file = Self::open(path)?;
        file.lock_exclusive().map_err(|e| Error::lock(path, e))?;
        tracing::trace!(lock = %path.display(), "acquired exclusive lock");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Acquire an exclusive lock on `path` without blocking
    pub fn try_exclusive(path: &Path) -> Result<Self> {
        let file = Self::open(path)?;
        file.try_lock_exclusive().map_err(|e| Error::lock(path, e))?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(path: &Path) -> Result<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| Error::lock(path, e))
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

/// Whether a lock error means another holder currently owns the lock
pub fn is_contended(error: &Error) -> bool {
    match error {
        Error::Lock { source, .. } => {
            source.kind() == io::ErrorKind::WouldBlock
                || source.raw_os_error() == fs2::lock_contended_error().raw_os_error()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_is_exclusive() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(".registry.lock");

        let first = FileLock::exclusive(&lock_path).unwrap();

        let second = FileLock::try_exclusive(&lock_path);
        assert!(is_contended(&second.unwrap_err()));

        drop(first);

        let third = FileLock::try_exclusive(&lock_path).unwrap();
        assert_eq!(third.path(), lock_path.as_path());
        assert!(lock_path.exists());
    }
}
