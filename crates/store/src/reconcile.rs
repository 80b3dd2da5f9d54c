//! Detection and operator-triggered repair of registry drift
//!
//! Composite operations are not atomic, so a crash can leave the registry
//! and the physical records disagreeing. Nothing here runs automatically.

use crate::backend::PhysicalBackend;
use crate::safe_id::SafeId;
use crate::store::RegisteredStore;
use regstore_core::{Error, Result, REGISTRY_STORAGE_ID};
use std::collections::BTreeSet;
use std::fmt;
use tracing::instrument;

/// Differences between the registry and the records physically present
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    /// Registered storage ids whose record is missing
    pub dangling: Vec<String>,
    /// Records no registry entry accounts for
    pub orphaned: Vec<SafeId>,
    /// Registered storage ids whose recorded safe id differs from the one
    /// derived with the current key
    pub mismatched: Vec<String>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.dangling.is_empty() && self.orphaned.is_empty() && self.mismatched.is_empty()
    }

    /// `Error::Consistency` summarising the drift, if there is any
    pub fn ensure_consistent(&self) -> Result<()> {
        if self.is_consistent() {
            return Ok(());
        }
        Err(Error::consistency(format!(
            "{} dangling, {} orphaned, {} mismatched",
            self.dangling.len(),
            self.orphaned.len(),
            self.mismatched.len()
        )))
    }
}

impl fmt::Display for ConsistencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_consistent() {
            return write!(f, "registry is consistent");
        }
        for id in &self.dangling {
            writeln!(f, "dangling: {id} (registered, record missing)")?;
        }
        for safe_id in &self.orphaned {
            writeln!(f, "orphaned: {safe_id} (record present, not registered)")?;
        }
        for id in &self.mismatched {
            writeln!(f, "mismatched: {id} (safe id differs from current key)")?;
        }
        Ok(())
    }
}

impl<B: PhysicalBackend> RegisteredStore<B> {
    /// Compare the persisted registry with the records present in the backend
    #[instrument(level = "debug", skip(self))]
    pub fn verify(&mut self) -> Result<ConsistencyReport> {
        let present: BTreeSet<SafeId> = self.backend().list_safe_ids()?.into_iter().collect();
        let registry_safe_id = self.backend().safe_id(REGISTRY_STORAGE_ID);

        let entries: Vec<(String, String)> = self
            .registry()?
            .iter()
            .map(|(id, entry)| (id.clone(), entry.safe_id.clone()))
            .collect();

        let mut report = ConsistencyReport::default();
        let mut accounted = BTreeSet::new();
        accounted.insert(registry_safe_id);

        for (storage_id, recorded_safe_id) in entries {
            let safe_id = self.backend().safe_id(&storage_id);
            if recorded_safe_id != safe_id.as_str() {
                report.mismatched.push(storage_id.clone());
            }
            if !present.contains(&safe_id) {
                report.dangling.push(storage_id);
            }
            accounted.insert(safe_id);
        }

        report.orphaned = present.difference(&accounted).cloned().collect();

        if report.is_consistent() {
            tracing::debug!("registry is consistent");
        } else {
            tracing::warn!(
                dangling = report.dangling.len(),
                orphaned = report.orphaned.len(),
                mismatched = report.mismatched.len(),
                "registry inconsistency detected"
            );
        }
        Ok(report)
    }

    /// Drop registry entries whose record is missing and persist the result.
    ///
    /// Returns the number of entries removed.
    #[instrument(level = "debug", skip(self))]
    pub fn prune_dangling(&mut self) -> Result<usize> {
        let _writers = self.begin_write()?;
        let report = self.verify()?;
        if report.dangling.is_empty() {
            return Ok(0);
        }

        let registry = self.ensure_registry()?;
        for storage_id in &report.dangling {
            registry.remove(storage_id);
        }
        self.persist_registry()?;

        tracing::info!(removed = report.dangling.len(), "pruned dangling registry entries");
        Ok(report.dangling.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::config::StoreConfig;
    use regstore_core::Value;

    fn store() -> (RegisteredStore<MemoryBackend>, MemoryBackend) {
        let backend = MemoryBackend::new();
        let config = StoreConfig::builder().with_root("/unused").build().unwrap();
        (
            RegisteredStore::with_backend(backend.clone(), config).unwrap(),
            backend,
        )
    }

    #[test]
    fn test_clean_store_is_consistent() {
        let (mut store, _backend) = store();
        assert!(store.create("a", &Value::Integer(1)));
        assert!(store.create("b", &Value::Integer(2)));

        let report = store.verify().unwrap();
        assert!(report.is_consistent(), "{report}");
        assert!(report.ensure_consistent().is_ok());
        assert_eq!(report.to_string(), "registry is consistent");
    }

    #[test]
    fn test_detects_dangling_and_orphaned() {
        let (mut store, backend) = store();
        assert!(store.create("a", &Value::Integer(1)));
        assert!(backend.remove_raw("a"));
        backend.put_raw("stray", b"\"x\"".to_vec());

        let report = store.verify().unwrap();
        assert_eq!(report.dangling, ["a"]);
        assert_eq!(report.orphaned, [backend.safe_id("stray")]);
        assert!(report.mismatched.is_empty());
        assert!(report.to_string().contains("dangling: a"));

        let err = report.ensure_consistent().unwrap_err();
        assert!(matches!(err, Error::Consistency { .. }));
        assert!(err.to_string().contains("1 dangling, 1 orphaned, 0 mismatched"));
    }

    #[test]
    fn test_prune_removes_only_dangling() {
        let (mut store, backend) = store();
        assert!(store.create("a", &Value::Integer(1)));
        assert!(store.create("b", &Value::Integer(2)));
        assert!(backend.remove_raw("a"));

        assert_eq!(store.prune_dangling().unwrap(), 1);
        assert!(store.get_registry_data("a", "*").is_false());
        assert!(!store.get_registry_data("b", "*").is_false());
        assert_eq!(store.prune_dangling().unwrap(), 0);
        assert!(store.verify().unwrap().is_consistent());
    }

    #[test]
    fn test_detects_entries_written_under_another_key() {
        use crate::backend::Placement;
        use crate::codec;
        use crate::registry::{Registry, RegistryEntry};
        use crate::safe_id::SafeIdGenerator;
        use regstore_core::Classification;

        let (mut store, backend) = store();
        let mut registry = Registry::new();
        registry.put(
            "a",
            RegistryEntry::new(
                "a",
                &SafeIdGenerator::new("old-key").derive("a"),
                Classification::new("integer"),
                Placement {
                    directory: "integer".to_string(),
                    extension: ".json".to_string(),
                },
                chrono::Utc::now(),
            ),
        );
        let payload = codec::encode(&registry.to_value().unwrap()).unwrap();
        backend.put_raw(REGISTRY_STORAGE_ID, payload);
        backend.put_raw("a", codec::encode(&Value::Integer(1)).unwrap());

        let report = store.verify().unwrap();
        assert_eq!(report.mismatched, ["a"]);
        assert!(report.dangling.is_empty());
        assert!(report.orphaned.is_empty());
    }
}
