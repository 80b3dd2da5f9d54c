//! One-file-per-record backend

use super::{Placement, PhysicalBackend, WriterLock};
use crate::safe_id::{SafeId, SafeIdGenerator};
use regstore_core::{
    Classification, Error, Result, RECORD_EXTENSION, REGISTRY_LOCK_FILENAME, WRITE_LOCK_FILENAME,
};
use regstore_utils::{
    ensure_private_dir, is_contended, remove_locked, write_atomic_locked, FileLock,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Stores each record at `<root>/<safe id>.json`.
///
/// The root is created owner-only on first write. Saves are atomic renames
/// made under an exclusive lock on `<root>/.write.lock`.
#[derive(Debug)]
pub struct FileBackend {
    root: PathBuf,
    safe_ids: SafeIdGenerator,
}

impl FileBackend {
    /// Create a backend rooted at `root`; nothing touches the disk yet
    pub fn new(root: impl Into<PathBuf>, safe_ids: SafeIdGenerator) -> Self {
        Self {
            root: root.into(),
            safe_ids,
        }
    }

    /// Full path of the record file for a storage id
    pub fn location(&self, storage_id: &str) -> PathBuf {
        self.root
            .join(format!("{}{}", self.safe_ids.derive(storage_id), RECORD_EXTENSION))
    }

    fn write_lock_path(&self) -> PathBuf {
        self.root.join(WRITE_LOCK_FILENAME)
    }
}

impl PhysicalBackend for FileBackend {
    fn safe_id(&self, storage_id: &str) -> SafeId {
        self.safe_ids.derive(storage_id)
    }

    fn placement(&self, classification: &Classification) -> Placement {
        Placement {
            directory: classification.storage_directory(),
            extension: RECORD_EXTENSION.to_string(),
        }
    }

    fn save(&mut self, storage_id: &str, payload: &[u8]) -> Result<()> {
        ensure_private_dir(&self.root)?;
        let location = self.location(storage_id);
        write_atomic_locked(&location, payload, &self.write_lock_path())?;
        tracing::debug!(
            storage_id,
            location = %location.display(),
            bytes = payload.len(),
            "saved record"
        );
        Ok(())
    }

    fn load(&self, storage_id: &str) -> Result<Option<Vec<u8>>> {
        let location = self.location(storage_id);
        match fs::read(&location) {
            Ok(bytes) => {
                tracing::debug!(storage_id, bytes = bytes.len(), "loaded record");
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(storage_id, "no record stored");
                Ok(None)
            }
            Err(e) => Err(Error::backend_io(location, "load", e)),
        }
    }

    fn delete(&mut self, storage_id: &str) -> Result<()> {
        let location = self.location(storage_id);
        if !location.exists() {
            return Err(Error::not_found(storage_id));
        }
        match remove_locked(&location, &self.write_lock_path()) {
            Ok(()) => {
                tracing::debug!(storage_id, location = %location.display(), "deleted record");
                Ok(())
            }
            // Lost a race with another deleter
            Err(Error::BackendIo { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Err(Error::not_found(storage_id))
            }
            Err(e) => Err(e),
        }
    }

    fn list_safe_ids(&self) -> Result<Vec<SafeId>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::backend_io(&self.root, "list records", e)),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::backend_io(&self.root, "list records", e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(stem) = name.strip_suffix(RECORD_EXTENSION) {
                if let Some(id) = SafeId::parse(stem) {
                    ids.push(id);
                }
            }
        }

        ids.sort();
        Ok(ids)
    }

    fn lock_writers(&self) -> Result<WriterLock> {
        ensure_private_dir(&self.root)?;
        let path = self.root.join(REGISTRY_LOCK_FILENAME);
        let lock = match FileLock::try_exclusive(&path) {
            Ok(lock) => lock,
            Err(e) if is_contended(&e) => {
                tracing::debug!(lock = %path.display(), "waiting for another writer");
                FileLock::exclusive(&path)?
            }
            Err(e) => return Err(e),
        };
        Ok(WriterLock::file(lock))
    }

    fn root(&self) -> Option<&Path> {
        Some(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn backend(dir: &TempDir) -> FileBackend {
        FileBackend::new(dir.path().join("records"), SafeIdGenerator::new("test-key"))
    }

    #[test]
    fn test_root_created_on_first_save() {
        let temp_dir = TempDir::new().unwrap();
        let mut backend = backend(&temp_dir);
        assert!(!temp_dir.path().join("records").exists());

        backend.save("user:42", b"\"payload\"").unwrap();
        assert!(temp_dir.path().join("records").is_dir());
    }

    #[test]
    fn test_save_load_delete() {
        let temp_dir = TempDir::new().unwrap();
        let mut backend = backend(&temp_dir);

        backend.save("a/b\\c", b"\"one\"").unwrap();
        assert_eq!(backend.load("a/b\\c").unwrap(), Some(b"\"one\"".to_vec()));

        let location = backend.location("a/b\\c");
        assert_eq!(location.parent(), Some(temp_dir.path().join("records").as_path()));
        assert!(location.to_string_lossy().ends_with(".json"));

        backend.delete("a/b\\c").unwrap();
        assert_eq!(backend.load("a/b\\c").unwrap(), None);
    }

    #[test]
    fn test_missing_records_are_distinguishable() {
        let temp_dir = TempDir::new().unwrap();
        let mut backend = backend(&temp_dir);

        assert_eq!(backend.load("ghost").unwrap(), None);
        assert!(backend.delete("ghost").unwrap_err().is_not_found());
    }

    #[test]
    fn test_empty_payload_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut backend = backend(&temp_dir);

        assert!(backend.save("empty", b"").is_err());
        assert_eq!(backend.load("empty").unwrap(), None);
    }

    #[test]
    fn test_list_ignores_lock_and_foreign_files() {
        let temp_dir = TempDir::new().unwrap();
        let mut backend = backend(&temp_dir);
        assert!(backend.list_safe_ids().unwrap().is_empty());

        backend.save("one", b"1").unwrap();
        backend.save("two", b"2").unwrap();
        fs::write(temp_dir.path().join("records").join("notes.json"), "x").unwrap();
        let _lock = backend.lock_writers().unwrap();

        let mut expected = vec![backend.safe_id("one"), backend.safe_id("two")];
        expected.sort();
        assert_eq!(backend.list_safe_ids().unwrap(), expected);
    }

    #[test]
    fn test_placement_uses_classification() {
        let temp_dir = TempDir::new().unwrap();
        let backend = backend(&temp_dir);
        let placement = backend.placement(&Classification::new("app::User"));
        assert_eq!(placement.directory, "app/User");
        assert_eq!(placement.extension, ".json");
    }
}
