//! Error types for regstore operations

mod builders;
mod types;

pub use types::{Error, Result};
