//! Builder methods for creating errors with context

use super::types::Error;
use std::path::PathBuf;

impl Error {
    /// Create a backend I/O error with context
    #[must_use]
    pub fn backend_io(
        location: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::BackendIo {
            location: location.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create a partial write error
    #[must_use]
    pub fn partial_write(location: impl Into<PathBuf>, expected: u64, written: u64) -> Self {
        Error::PartialWrite {
            location: location.into(),
            expected,
            written,
        }
    }

    /// Create a not-found error
    #[must_use]
    pub fn not_found(storage_id: impl Into<String>) -> Self {
        Error::NotFound {
            storage_id: storage_id.into(),
        }
    }

    /// Create an encode error
    #[must_use]
    pub fn encode(message: impl Into<String>) -> Self {
        Error::Encode {
            message: message.into(),
        }
    }

    /// Create a decode error
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Error::Decode {
            message: message.into(),
        }
    }

    /// Create a reserved id error
    #[must_use]
    pub fn reserved_id(storage_id: impl Into<String>) -> Self {
        Error::ReservedId {
            storage_id: storage_id.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a consistency error
    #[must_use]
    pub fn consistency(message: impl Into<String>) -> Self {
        Error::Consistency {
            message: message.into(),
        }
    }

    /// Create a lock error
    #[must_use]
    pub fn lock(location: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Lock {
            location: location.into(),
            source,
        }
    }

    /// Whether this is the backend's "no such location" signal
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
