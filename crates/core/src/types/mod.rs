//! Core domain types for `regstore`.
//!
//! - **`value`**: the closed, tagged value model every record stores
//! - **`classification`**: the type tag recorded for a stored value

pub mod classification;
pub mod value;

pub use classification::*;
pub use value::*;
