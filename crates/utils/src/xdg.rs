use std::env;
use std::path::PathBuf;

/// XDG Base Directory paths for regstore
pub struct XdgPaths;

impl XdgPaths {
    /// Get XDG_DATA_HOME/regstore or fallback
    pub fn data_dir() -> PathBuf {
        env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|home| home.join(".local/share"))
                    .unwrap_or_else(|| PathBuf::from(".local/share"))
            })
            .join("regstore")
    }

    /// Default root under which records are stored
    pub fn records_dir() -> PathBuf {
        Self::data_dir().join("records")
    }
}
