//! Shared utilities for regstore
//!
//! File-system helpers used by the physical backend (atomic locked writes,
//! private storage roots, XDG locations) and the tracing setup shared by the
//! binary.

pub mod atomic_file;
pub mod directory;
pub mod file_lock;
pub mod tracing;
pub mod xdg;

pub use atomic_file::*;
pub use directory::*;
pub use file_lock::*;
pub use xdg::*;
