//! Registry of stored records
//!
//! The registry maps every live storage id to metadata describing its record.
//! It is persisted as an ordinary record under the reserved id, encoded as a
//! map of `RegistryEntry` records keyed by storage id.

use crate::backend::Placement;
use crate::codec;
use crate::safe_id::SafeId;
use chrono::{DateTime, TimeZone, Utc};
use regstore_core::{
    is_reserved, Classification, Error, Result, Value, REGISTRY_ENTRY_SCHEMA, REGISTRY_WILDCARD,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata describing one stored record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    pub storage_id: String,
    pub safe_id: String,
    pub classification: Classification,
    pub storage_directory: String,
    pub storage_extension: String,
    /// Time of the last write, persisted as unix seconds
    #[serde(with = "chrono::serde::ts_seconds")]
    pub modified: DateTime<Utc>,
}

impl RegistryEntry {
    /// Describe a record written at `modified`
    pub fn new(
        storage_id: impl Into<String>,
        safe_id: &SafeId,
        classification: Classification,
        placement: Placement,
        modified: DateTime<Utc>,
    ) -> Self {
        Self {
            storage_id: storage_id.into(),
            safe_id: safe_id.to_string(),
            classification,
            storage_directory: placement.directory,
            storage_extension: placement.extension,
            // Persisted with second precision
            modified: Utc
                .timestamp_opt(modified.timestamp(), 0)
                .single()
                .unwrap_or(modified),
        }
    }

    /// A single field by its persisted name, or the whole entry for `"*"`
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            REGISTRY_WILDCARD => self.to_value().ok(),
            "storageId" => Some(Value::from(self.storage_id.as_str())),
            "safeId" => Some(Value::from(self.safe_id.as_str())),
            "classification" => Some(Value::from(self.classification.as_str())),
            "storageDirectory" => Some(Value::from(self.storage_directory.as_str())),
            "storageExtension" => Some(Value::from(self.storage_extension.as_str())),
            "modified" => Some(Value::Integer(self.modified.timestamp())),
            _ => None,
        }
    }

    /// The entry as a `RegistryEntry` record
    pub fn to_value(&self) -> Result<Value> {
        Value::from_serialize(REGISTRY_ENTRY_SCHEMA, self)
    }

    /// Read an entry back from its record form
    pub fn from_value(value: &Value) -> Result<Self> {
        value.deserialize_into()
    }
}

/// In-memory mapping from storage id to registry entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    entries: BTreeMap<String, RegistryEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, storage_id: &str) -> Option<&RegistryEntry> {
        self.entries.get(storage_id)
    }

    /// Insert or replace the entry of `storage_id`
    pub fn put(&mut self, storage_id: impl Into<String>, entry: RegistryEntry) {
        self.entries.insert(storage_id.into(), entry);
    }

    pub fn remove(&mut self, storage_id: &str) -> Option<RegistryEntry> {
        self.entries.remove(storage_id)
    }

    pub fn contains(&self, storage_id: &str) -> bool {
        self.entries.contains_key(storage_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RegistryEntry)> {
        self.entries.iter()
    }

    pub fn storage_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Classification of an encoded record
    pub fn classify(payload: &[u8]) -> Result<Classification> {
        codec::classify(payload)
    }

    /// Snapshot of all entries
    pub fn to_map(&self) -> BTreeMap<String, RegistryEntry> {
        self.entries.clone()
    }

    /// The value persisted under the reserved id
    pub fn to_value(&self) -> Result<Value> {
        let mut entries = BTreeMap::new();
        for (storage_id, entry) in &self.entries {
            entries.insert(storage_id.clone(), entry.to_value()?);
        }
        Ok(Value::Map(entries))
    }

    /// Rebuild a registry from its persisted value
    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::Map(raw) = value else {
            return Err(Error::decode(format!(
                "registry record holds {}, expected a map",
                value.classification()
            )));
        };

        let mut entries = BTreeMap::new();
        for (storage_id, raw_entry) in raw {
            if is_reserved(storage_id) {
                tracing::debug!("dropping self-referencing registry entry");
                continue;
            }
            let entry = RegistryEntry::from_value(raw_entry).map_err(|e| {
                Error::decode(format!("registry entry '{storage_id}' is corrupt: {e}"))
            })?;
            entries.insert(storage_id.clone(), entry);
        }

        Ok(Self { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safe_id::SafeIdGenerator;

    fn entry(storage_id: &str, classification: &str) -> RegistryEntry {
        let classification = Classification::new(classification);
        let placement = Placement {
            directory: classification.storage_directory(),
            extension: ".json".to_string(),
        };
        RegistryEntry::new(
            storage_id,
            &SafeIdGenerator::new("k").derive(storage_id),
            classification,
            placement,
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        )
    }

    #[test]
    fn test_put_get_remove() {
        let mut registry = Registry::new();
        assert!(registry.is_empty());

        registry.put("a", entry("a", "string"));
        registry.put("b", entry("b", "integer"));
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("a"));
        assert_eq!(registry.storage_ids().collect::<Vec<_>>(), ["a", "b"]);

        registry.put("a", entry("a", "array"));
        assert_eq!(registry.get("a").unwrap().classification.as_str(), "array");

        assert!(registry.remove("a").is_some());
        assert!(registry.remove("a").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_entry_fields_use_persisted_names() {
        let entry = entry("user:42", "app\\User");

        assert_eq!(entry.field("storageId"), Some(Value::from("user:42")));
        assert_eq!(entry.field("storageDirectory"), Some(Value::from("app/User")));
        assert_eq!(entry.field("storageExtension"), Some(Value::from(".json")));
        assert_eq!(entry.field("modified"), Some(Value::Integer(1_700_000_000)));
        assert_eq!(entry.field("nope"), None);

        let whole = entry.field("*").unwrap();
        assert_eq!(whole.schema(), Some(REGISTRY_ENTRY_SCHEMA));
        assert_eq!(whole.get("classification"), Some(&Value::from("app\\User")));
    }

    #[test]
    fn test_value_roundtrip() {
        let mut registry = Registry::new();
        registry.put("a", entry("a", "string"));
        registry.put("b/c", entry("b/c", "app::Thing"));

        let value = registry.to_value().unwrap();
        assert_eq!(value.classification().as_str(), "map");
        assert_eq!(Registry::from_value(&value).unwrap(), registry);
    }

    #[test]
    fn test_legacy_self_entry_is_dropped() {
        let mut registry = Registry::new();
        registry.put("a", entry("a", "string"));
        let Value::Map(mut raw) = registry.to_value().unwrap() else {
            unreachable!()
        };
        raw.insert("registry".to_string(), entry("registry", "array").to_value().unwrap());

        let loaded = Registry::from_value(&Value::Map(raw)).unwrap();
        assert_eq!(loaded, registry);
    }

    #[test]
    fn test_malformed_registry_is_a_decode_error() {
        assert!(matches!(
            Registry::from_value(&Value::Integer(1)).unwrap_err(),
            Error::Decode { .. }
        ));

        let broken = Value::map([("a", Value::map([("storageId", Value::from("a"))]))]);
        assert!(matches!(
            Registry::from_value(&broken).unwrap_err(),
            Error::Decode { .. }
        ));
    }

    #[test]
    fn test_classify_reads_payload_tag() {
        let payload = codec::encode(&Value::record("app::User", [("n", Value::Null)])).unwrap();
        assert_eq!(Registry::classify(&payload).unwrap().as_str(), "app::User");
    }
}
