//! Registered key/value storage
//!
//! Values are stored under caller-chosen storage ids. Next to every record
//! the store keeps a registry entry (classification, placement, modification
//! time), and the registry itself is persisted as a record under the
//! reserved id `"registry"`.
//!
//! ```no_run
//! use regstore_core::Value;
//! use regstore_store::{RegisteredStore, StoreConfig};
//!
//! # fn main() -> regstore_core::Result<()> {
//! let config = StoreConfig::builder().with_root("/var/lib/app/records").build()?;
//! let mut store = RegisteredStore::open(config)?;
//!
//! store.try_create("user:42", &Value::map([("name", Value::from("Ada"))]))?;
//! let classification = store.try_registry_data("user:42", "classification")?;
//! assert_eq!(classification, Some(Value::from("map")));
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod codec;
pub mod config;
pub mod reconcile;
pub mod registry;
pub mod safe_id;
pub mod store;

pub use backend::{FileBackend, MemoryBackend, PhysicalBackend, Placement, WriterLock};
pub use config::{ConfigSource, StoreConfig, StoreConfigBuilder, UpdateStrategy};
pub use reconcile::ConsistencyReport;
pub use registry::{Registry, RegistryEntry};
pub use safe_id::{SafeId, SafeIdGenerator};
pub use store::RegisteredStore;
