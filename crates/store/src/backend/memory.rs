//! In-memory backend with failure injection

use super::{Placement, PhysicalBackend, WriterLock};
use crate::safe_id::{SafeId, SafeIdGenerator};
use parking_lot::RwLock;
use regstore_core::{Classification, Error, Result, DEFAULT_SAFE_ID_KEY, RECORD_EXTENSION};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Default)]
struct MemoryState {
    records: HashMap<SafeId, Vec<u8>>,
    failing_saves: HashSet<String>,
    failing_deletes: HashSet<String>,
}

/// Non-persistent backend, primarily for tests.
///
/// Clones share the same records, so a clone kept by a test observes what a
/// store did with the original. Saves and deletes can be made to fail per
/// storage id to simulate a crash between the steps of a composite operation.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    safe_ids: SafeIdGenerator,
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryBackend {
    /// Create an empty backend using the default safe id key
    pub fn new() -> Self {
        Self::with_generator(SafeIdGenerator::new(DEFAULT_SAFE_ID_KEY))
    }

    /// Create an empty backend with a specific safe id generator
    pub fn with_generator(safe_ids: SafeIdGenerator) -> Self {
        Self {
            safe_ids,
            state: Arc::new(RwLock::new(MemoryState::default())),
        }
    }

    /// Make every subsequent save of `storage_id` fail
    pub fn fail_saves_for(&self, storage_id: &str) {
        self.state.write().failing_saves.insert(storage_id.to_string());
    }

    /// Make every subsequent delete of `storage_id` fail
    pub fn fail_deletes_for(&self, storage_id: &str) {
        self.state
            .write()
            .failing_deletes
            .insert(storage_id.to_string());
    }

    /// Remove all injected failures
    pub fn clear_failures(&self) {
        let mut state = self.state.write();
        state.failing_saves.clear();
        state.failing_deletes.clear();
    }

    /// Number of records held
    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrite the raw payload of a record, bypassing all checks
    pub fn put_raw(&self, storage_id: &str, payload: Vec<u8>) {
        let safe_id = self.safe_ids.derive(storage_id);
        self.state.write().records.insert(safe_id, payload);
    }

    /// Drop a record, bypassing all checks
    pub fn remove_raw(&self, storage_id: &str) -> bool {
        let safe_id = self.safe_ids.derive(storage_id);
        self.state.write().records.remove(&safe_id).is_some()
    }

    fn location(&self, storage_id: &str) -> PathBuf {
        PathBuf::from(format!("memory://{}", self.safe_ids.derive(storage_id)))
    }

    fn injected(&self, storage_id: &str, operation: &str) -> Error {
        Error::backend_io(
            self.location(storage_id),
            operation,
            io::Error::new(io::ErrorKind::Other, "injected failure"),
        )
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicalBackend for MemoryBackend {
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
        if payload.is_empty() {
            return Err(Error::partial_write(self.location(storage_id), 0, 0));
        }
        if self.state.read().failing_saves.contains(storage_id) {
            return Err(self.injected(storage_id, "save"));
        }
        let safe_id = self.safe_ids.derive(storage_id);
        self.state.write().records.insert(safe_id, payload.to_vec());
        tracing::debug!(storage_id, bytes = payload.len(), "saved record in memory");
        Ok(())
    }

    fn load(&self, storage_id: &str) -> Result<Option<Vec<u8>>> {
        let safe_id = self.safe_ids.derive(storage_id);
        Ok(self.state.read().records.get(&safe_id).cloned())
    }

    fn delete(&mut self, storage_id: &str) -> Result<()> {
        if self.state.read().failing_deletes.contains(storage_id) {
            return Err(self.injected(storage_id, "delete"));
        }
        let safe_id = self.safe_ids.derive(storage_id);
        match self.state.write().records.remove(&safe_id) {
            Some(_) => Ok(()),
            None => Err(Error::not_found(storage_id)),
        }
    }

    fn list_safe_ids(&self) -> Result<Vec<SafeId>> {
        let mut ids: Vec<SafeId> = self.state.read().records.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn lock_writers(&self) -> Result<WriterLock> {
        Ok(WriterLock::none())
    }
}
