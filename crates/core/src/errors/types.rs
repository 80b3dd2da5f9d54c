//! Core error type definitions

use std::path::PathBuf;

/// Result type alias for regstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for regstore operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A physical save/load/delete failed
    #[error("backend {operation} failed for '{}': {source}", .location.display())]
    BackendIo {
        location: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// A save did not persist the whole payload
    #[error("partial write to '{}': expected {expected} bytes, wrote {written}", .location.display())]
    PartialWrite {
        location: PathBuf,
        expected: u64,
        written: u64,
    },

    /// No record exists for the storage id
    #[error("no record stored under '{storage_id}'")]
    NotFound { storage_id: String },

    /// A value could not be turned into a record payload
    #[error("failed to encode value: {message}")]
    Encode { message: String },

    /// Stored bytes could not be turned back into a value
    #[error("failed to decode record: {message}")]
    Decode { message: String },

    /// The reserved registry id was used for application data
    #[error("storage id '{storage_id}' is reserved")]
    ReservedId { storage_id: String },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Registry and physical records disagree
    #[error("registry inconsistency: {message}")]
    Consistency { message: String },

    /// An advisory file lock could not be taken
    #[error("failed to lock '{}': {source}", .location.display())]
    Lock {
        location: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
