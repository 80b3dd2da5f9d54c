/// Constants used throughout the regstore codebase

/// Storage id under which the registry persists itself; never registered
pub const REGISTRY_STORAGE_ID: &str = "registry";

/// Field-name wildcard selecting a whole registry entry
pub const REGISTRY_WILDCARD: &str = "*";

/// Extension of every record file written by the file backend
pub const RECORD_EXTENSION: &str = ".json";

/// Schema name of the records making up the persisted registry
pub const REGISTRY_ENTRY_SCHEMA: &str = "RegistryEntry";

/// Default key used to derive safe ids.
///
/// Roots written with this key are only readable by stores using it too.
pub const DEFAULT_SAFE_ID_KEY: &str = "sdfghu7654esdfghbvcdsw3456yhgbnju765432345rtfg";

// Environment variable names
pub const REGSTORE_ROOT_VAR: &str = "REGSTORE_ROOT";
pub const REGSTORE_SAFE_ID_KEY_VAR: &str = "REGSTORE_SAFE_ID_KEY";
pub const REGSTORE_UPDATE_STRATEGY_VAR: &str = "REGSTORE_UPDATE_STRATEGY";
pub const REGSTORE_COORDINATE_WRITERS_VAR: &str = "REGSTORE_COORDINATE_WRITERS";

// Lock files kept in the storage root
pub const WRITE_LOCK_FILENAME: &str = ".write.lock";
pub const REGISTRY_LOCK_FILENAME: &str = ".registry.lock";

/// Whether a storage id is the reserved registry id
pub fn is_reserved(storage_id: &str) -> bool {
    storage_id == REGISTRY_STORAGE_ID
}
