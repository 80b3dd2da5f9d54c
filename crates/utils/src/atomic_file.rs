//! Atomic, locked file writes so a record is never observed half-written

use crate::file_lock::FileLock;
use regstore_core::{Error, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use uuid::Uuid;

/// Write data to a file atomically by writing to a temporary file and renaming.
///
/// Fails with `Error::PartialWrite` when `content` is empty or when fewer bytes
/// than `content.len()` reached the temporary file.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        Error::configuration(format!("invalid record path '{}': no parent directory", path.display()))
    })?;

    if content.is_empty() {
        return Err(Error::partial_write(path, 0, 0));
    }

    // Same directory as the target so the rename stays on one filesystem
    let temp_path = parent.join(format!(".{}.tmp", Uuid::new_v4()));

    let result = (|| -> Result<()> {
        let mut file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp_path)
            .map_err(|e| Error::backend_io(&temp_path, "create temporary file", e))?;

        file.write_all(content)
            .map_err(|e| Error::backend_io(&temp_path, "write temporary file", e))?;

        file.sync_all()
            .map_err(|e| Error::backend_io(&temp_path, "sync temporary file", e))?;

        let written = file
            .metadata()
            .map_err(|e| Error::backend_io(&temp_path, "stat temporary file", e))?
            .len();
        if written != content.len() as u64 {
            return Err(Error::partial_write(path, content.len() as u64, written));
        }

        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
        return result;
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        Error::backend_io(path, "atomic rename", e)
    })?;

    Ok(())
}

/// Write atomically while holding an exclusive lock on `lock_path`
pub fn write_atomic_locked(path: &Path, content: &[u8], lock_path: &Path) -> Result<()> {
    let _guard = FileLock::exclusive(lock_path)?;
    write_atomic(path, content)
}

/// Remove a file while holding an exclusive lock on `lock_path`
pub fn remove_locked(path: &Path, lock_path: &Path) -> Result<()> {
    let _guard = FileLock::exclusive(lock_path)?;
    fs::remove_file(path).map_err(|e| Error::backend_io(path, "delete", e))
}
