//! Core domain types, errors, and constants for `regstore`.
//!
//! ## Key Components
//!
//! - **`errors`**: the `Error` enum and `Result` alias shared by every crate in
//!   the workspace.
//! - **`types`**: the tagged `Value` model stored by the registered store and
//!   the `Classification` tag recorded for each stored value.
//! - **`constants`**: the reserved registry id, default keys, and environment
//!   variable names.

pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, Result},
    types::*,
};
