//! The registered store
//!
//! Composes the codec, a physical backend and the registry. Every successful
//! mutation of an application record is followed by persisting the whole
//! registry under the reserved id, so the registry keeps describing exactly
//! the set of stored records.
//!
//! Two surfaces are offered. The `try_*` methods return `Result` and tell
//! "absent" apart from "failed". The boundary methods (`create`, `read`,
//! `update`, `delete`, `get_registry_data`, `get_registry`) never fail: errors
//! are logged and collapse to `false`.

use crate::backend::{FileBackend, PhysicalBackend, WriterLock};
use crate::codec;
use crate::config::{StoreConfig, UpdateStrategy};
use crate::registry::{Registry, RegistryEntry};
use crate::safe_id::SafeIdGenerator;
use chrono::Utc;
use regstore_core::{is_reserved, Error, Result, Value, REGISTRY_STORAGE_ID, REGISTRY_WILDCARD};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::instrument;

/// Key/value store that keeps a persisted registry of its records
pub struct RegisteredStore<B: PhysicalBackend> {
    backend: B,
    config: StoreConfig,
    /// Loaded lazily; `None` forces a reload from the backend
    registry: Option<Registry>,
}

impl RegisteredStore<FileBackend> {
    /// Open a store on the file backend rooted at `config.root`.
    ///
    /// Nothing is read or written until the first operation.
    pub fn open(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let backend = FileBackend::new(
            config.root.clone(),
            SafeIdGenerator::new(&config.safe_id_key),
        );
        Self::with_backend(backend, config)
    }
}

impl<B: PhysicalBackend> RegisteredStore<B> {
    /// Build a store over any backend
    pub fn with_backend(backend: B, config: StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            backend,
            config,
            registry: None,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Root directory of the physical storage, if the backend has one
    pub fn storage_path(&self) -> Option<&Path> {
        self.backend.root()
    }

    // ------------------------------------------------------------------
    // Result layer
    // ------------------------------------------------------------------

    /// Store `value` under `storage_id` and register it.
    ///
    /// Writing the reserved id replaces the persisted registry and skips
    /// registration.
    #[instrument(level = "debug", skip(self, value))]
    pub fn try_create(&mut self, storage_id: &str, value: &Value) -> Result<()> {
        let _writers = self.begin_write()?;
        self.create_unlocked(storage_id, value)
    }

    /// Load the value stored under `storage_id`; `Ok(None)` when absent
    #[instrument(level = "debug", skip(self))]
    pub fn try_read(&self, storage_id: &str) -> Result<Option<Value>> {
        match self.backend.load(storage_id)? {
            Some(payload) => codec::decode(&payload).map(Some),
            None => Ok(None),
        }
    }

    /// Replace the value stored under `storage_id` using the configured
    /// [`UpdateStrategy`]
    #[instrument(level = "debug", skip(self, value))]
    pub fn try_update(&mut self, storage_id: &str, value: &Value) -> Result<()> {
        let _writers = self.begin_write()?;
        match self.config.update_strategy {
            UpdateStrategy::Replace => self.replace_unlocked(storage_id, value),
            UpdateStrategy::DeleteThenCreate => {
                self.delete_unlocked(storage_id)?;
                self.create_unlocked(storage_id, value)
            }
        }
    }

    /// Remove the record of `storage_id` and its registry entry.
    ///
    /// Fails with `Error::NotFound` when nothing is stored, leaving the
    /// registry untouched.
    #[instrument(level = "debug", skip(self))]
    pub fn try_delete(&mut self, storage_id: &str) -> Result<()> {
        let _writers = self.begin_write()?;
        self.delete_unlocked(storage_id)
    }

    /// Registry data of `storage_id` as currently persisted.
    ///
    /// `name` selects one field; `"*"` returns the whole entry as a
    /// `RegistryEntry` record. `Ok(None)` when there is no entry or field.
    #[instrument(level = "debug", skip(self))]
    pub fn try_registry_data(&self, storage_id: &str, name: &str) -> Result<Option<Value>> {
        let Some(payload) = self.backend.load(REGISTRY_STORAGE_ID)? else {
            return Ok(None);
        };
        let registry = Registry::from_value(&codec::decode(&payload)?)?;
        Ok(registry.get(storage_id).and_then(|entry| entry.field(name)))
    }

    /// The registry of this store, reloaded first when writers are coordinated
    pub fn registry(&mut self) -> Result<&Registry> {
        if self.config.coordinate_writers {
            self.registry = None;
        }
        let registry: &Registry = self.ensure_registry()?;
        Ok(registry)
    }

    // ------------------------------------------------------------------
    // Boundary layer
    // ------------------------------------------------------------------

    /// Store a value; `false` on any failure
    pub fn create(&mut self, storage_id: &str, value: &Value) -> bool {
        report("create", storage_id, self.try_create(storage_id, value))
    }

    /// Read a value; `Value::Bool(false)` when absent or unreadable.
    ///
    /// A stored boolean `false` reads back identically to an absent record.
    /// Use [`try_read`](Self::try_read) to tell the two apart.
    pub fn read(&self, storage_id: &str) -> Value {
        match self.try_read(storage_id) {
            Ok(Some(value)) => value,
            Ok(None) => Value::Bool(false),
            Err(e) => {
                tracing::warn!(storage_id, error = %e, "read failed");
                Value::Bool(false)
            }
        }
    }

    /// Replace a value; `false` on any failure
    pub fn update(&mut self, storage_id: &str, value: &Value) -> bool {
        report("update", storage_id, self.try_update(storage_id, value))
    }

    /// Delete a value; `false` on any failure, including when nothing is stored
    pub fn delete(&mut self, storage_id: &str) -> bool {
        report("delete", storage_id, self.try_delete(storage_id))
    }

    /// Registry data of `storage_id`; `Value::Bool(false)` when absent
    pub fn get_registry_data(&self, storage_id: &str, name: &str) -> Value {
        match self.try_registry_data(storage_id, name) {
            Ok(Some(value)) => value,
            Ok(None) => Value::Bool(false),
            Err(e) => {
                tracing::warn!(storage_id, name, error = %e, "registry lookup failed");
                Value::Bool(false)
            }
        }
    }

    /// Whole registry entry of `storage_id`; `Value::Bool(false)` when absent
    pub fn get_registry_entry(&self, storage_id: &str) -> Value {
        self.get_registry_data(storage_id, REGISTRY_WILDCARD)
    }

    /// Snapshot of the registry; empty when it cannot be loaded
    pub fn get_registry(&mut self) -> BTreeMap<String, RegistryEntry> {
        match self.registry() {
            Ok(registry) => registry.to_map(),
            Err(e) => {
                tracing::warn!(error = %e, "registry unavailable");
                BTreeMap::new()
            }
        }
    }

    // ------------------------------------------------------------------
    // Internals; callers hold the writer lock
    // ------------------------------------------------------------------

    /// Take the writer lock and drop the cached registry so it is re-read
    /// under the lock
    pub(crate) fn begin_write(&mut self) -> Result<WriterLock> {
        if !self.config.coordinate_writers {
            return Ok(WriterLock::none());
        }
        let lock = self.backend.lock_writers()?;
        self.registry = None;
        Ok(lock)
    }

    /// Load the registry if it is not cached.
    ///
    /// A missing registry record yields an empty registry that lives only in
    /// memory; the next locked mutation persists it. Read paths never write.
    pub(crate) fn ensure_registry(&mut self) -> Result<&mut Registry> {
        let registry = match self.registry.take() {
            Some(registry) => registry,
            None => match self.backend.load(REGISTRY_STORAGE_ID)? {
                Some(payload) => {
                    let registry = Registry::from_value(&codec::decode(&payload)?)?;
                    tracing::debug!(entries = registry.len(), "loaded registry");
                    registry
                }
                None => {
                    tracing::debug!("no registry persisted yet, starting empty");
                    Registry::new()
                }
            },
        };
        Ok(self.registry.insert(registry))
    }

    fn create_unlocked(&mut self, storage_id: &str, value: &Value) -> Result<()> {
        let payload = codec::encode(value)?;

        if is_reserved(storage_id) {
            self.backend.save(storage_id, &payload)?;
            self.registry = None;
            tracing::debug!("replaced persisted registry");
            return Ok(());
        }

        // Load first so a corrupt registry fails before the record is written
        self.ensure_registry()?;
        self.backend.save(storage_id, &payload)?;
        self.register(storage_id, &payload)?;
        self.persist_registry()
    }

    fn replace_unlocked(&mut self, storage_id: &str, value: &Value) -> Result<()> {
        let payload = codec::encode(value)?;

        if is_reserved(storage_id) {
            self.backend.save(storage_id, &payload)?;
            self.registry = None;
            return Ok(());
        }

        self.ensure_registry()?;
        if self.backend.load(storage_id)?.is_none() {
            return Err(Error::not_found(storage_id));
        }
        self.backend.save(storage_id, &payload)?;
        self.register(storage_id, &payload)?;
        self.persist_registry()
    }

    fn delete_unlocked(&mut self, storage_id: &str) -> Result<()> {
        if is_reserved(storage_id) {
            self.backend.delete(storage_id)?;
            self.registry = None;
            tracing::debug!("deleted persisted registry");
            return Ok(());
        }

        self.ensure_registry()?;
        self.backend.delete(storage_id)?;
        self.ensure_registry()?.remove(storage_id);
        self.persist_registry()
    }

    fn register(&mut self, storage_id: &str, payload: &[u8]) -> Result<()> {
        let classification = Registry::classify(payload)?;
        let entry = RegistryEntry::new(
            storage_id,
            &self.backend.safe_id(storage_id),
            classification.clone(),
            self.backend.placement(&classification),
            Utc::now(),
        );
        self.ensure_registry()?.put(storage_id, entry);
        Ok(())
    }

    /// Write the in-memory registry under the reserved id
    pub(crate) fn persist_registry(&mut self) -> Result<()> {
        let value = self.ensure_registry()?.to_value()?;
        let payload = codec::encode(&value)?;

        if self.config.update_strategy == UpdateStrategy::DeleteThenCreate {
            match self.backend.delete(REGISTRY_STORAGE_ID) {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }
        self.backend.save(REGISTRY_STORAGE_ID, &payload)
    }
}

fn report(operation: &str, storage_id: &str, result: Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(operation, storage_id, error = %e, "store operation failed");
            false
        }
    }
}
