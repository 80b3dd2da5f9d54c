//! Storage root creation with restrictive permissions

use regstore_core::{Error, Result};
use std::fs;
use std::path::Path;

/// Mode used for storage roots created on unix
pub const PRIVATE_DIR_MODE: u32 = 0o700;

/// Create `path` (and missing parents) readable only by the owner.
///
/// Returns `true` when the directory was created by this call. An existing
/// directory is left untouched.
pub fn ensure_private_dir(path: &Path) -> Result<bool> {
    if path.is_dir() {
        return Ok(false);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;

        fs::DirBuilder::new()
            .recursive(true)
            .mode(PRIVATE_DIR_MODE)
            .create(path)
            .map_err(|e| Error::backend_io(path, "create storage root", e))?;
    }

    #[cfg(not(unix))]
    {
        fs::create_dir_all(path).map_err(|e| Error::backend_io(path, "create storage root", e))?;
    }

    tracing::debug!(root = %path.display(), "created storage root");
    Ok(true)
}
