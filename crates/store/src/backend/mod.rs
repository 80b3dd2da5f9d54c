//! Physical backends: raw save/load/delete of record payloads
//!
//! A backend owns the mapping from storage id to physical location. Callers
//! only ever hand it storage ids; the location is derived from the safe id.

mod file;
mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

use crate::safe_id::SafeId;
use regstore_core::{Classification, Result};
use regstore_utils::FileLock;
use std::path::Path;

/// Backend-specific placement hints recorded in registry entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub directory: String,
    pub extension: String,
}

/// Guard returned by [`PhysicalBackend::lock_writers`]; released on drop
#[derive(Debug)]
pub struct WriterLock {
    _lock: Option<FileLock>,
}

impl WriterLock {
    /// A guard that holds nothing, for backends without shared state
    pub fn none() -> Self {
        Self { _lock: None }
    }

    /// A guard holding an advisory file lock
    pub fn file(lock: FileLock) -> Self {
        Self { _lock: Some(lock) }
    }

    /// Whether a real lock is held
    pub fn is_held(&self) -> bool {
        self._lock.is_some()
    }
}

/// Raw payload storage keyed by storage id
pub trait PhysicalBackend {
    /// Safe id used to locate the record of `storage_id`
    fn safe_id(&self, storage_id: &str) -> SafeId;

    /// Placement hints for a record of the given classification
    fn placement(&self, classification: &Classification) -> Placement;

    /// Persist a payload, replacing any previous one.
    ///
    /// Empty payloads and short writes are failures.
    fn save(&mut self, storage_id: &str, payload: &[u8]) -> Result<()>;

    /// Load a payload; `Ok(None)` when no record exists
    fn load(&self, storage_id: &str) -> Result<Option<Vec<u8>>>;

    /// Remove a payload; `Error::NotFound` when no record exists
    fn delete(&mut self, storage_id: &str) -> Result<()>;

    /// Safe ids of every record physically present
    fn list_safe_ids(&self) -> Result<Vec<SafeId>>;

    /// Serialise multi-step writers sharing this backend's storage
    fn lock_writers(&self) -> Result<WriterLock>;

    /// Root directory of the storage, when there is one
    fn root(&self) -> Option<&Path> {
        None
    }
}
