//! Store configuration with precedence tracking

use regstore_core::{
    Error, Result, DEFAULT_SAFE_ID_KEY, REGSTORE_COORDINATE_WRITERS_VAR, REGSTORE_ROOT_VAR,
    REGSTORE_SAFE_ID_KEY_VAR, REGSTORE_UPDATE_STRATEGY_VAR,
};
use regstore_utils::XdgPaths;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// How `update` replaces an existing record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateStrategy {
    /// Overwrite the record in place with an atomic write. The old record and
    /// its registry entry survive any failure.
    #[default]
    Replace,
    /// Delete the record, then create it again. Not atomic: a failure between
    /// the two steps loses both the record and its registry entry.
    DeleteThenCreate,
}

impl fmt::Display for UpdateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateStrategy::Replace => write!(f, "replace"),
            UpdateStrategy::DeleteThenCreate => write!(f, "delete-then-create"),
        }
    }
}

impl FromStr for UpdateStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(UpdateStrategy::Replace),
            "delete-then-create" | "delete_then_create" => Ok(UpdateStrategy::DeleteThenCreate),
            other => Err(Error::configuration(format!(
                "invalid update strategy '{other}' (expected 'replace' or 'delete-then-create')"
            ))),
        }
    }
}

/// Source of configuration for debugging and precedence tracking
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Default configuration
    Default,
    /// Environment variable
    EnvironmentVariable(String),
    /// Command line argument
    CommandLine,
    /// Set programmatically through the builder
    Builder,
}

/// Configuration of a registered store
#[derive(Clone)]
pub struct StoreConfig {
    /// Root directory of the file backend
    pub root: PathBuf,
    /// Key used to derive safe ids
    pub safe_id_key: String,
    /// How updates replace records
    pub update_strategy: UpdateStrategy,
    /// Serialise mutating operations across store instances sharing a root
    pub coordinate_writers: bool,
    /// Where the last override came from
    pub source: ConfigSource,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: XdgPaths::records_dir(),
            safe_id_key: DEFAULT_SAFE_ID_KEY.to_string(),
            update_strategy: UpdateStrategy::default(),
            coordinate_writers: true,
            source: ConfigSource::Default,
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("root", &self.root)
            .field("safe_id_key", &"<redacted>")
            .field("update_strategy", &self.update_strategy)
            .field("coordinate_writers", &self.coordinate_writers)
            .field("source", &self.source)
            .finish()
    }
}

impl StoreConfig {
    /// Start a builder from the defaults
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::new()
    }

    /// Defaults overridden by `REGSTORE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(root) = lookup(REGSTORE_ROOT_VAR).filter(|v| !v.is_empty()) {
            config.root = PathBuf::from(root);
            config.source = ConfigSource::EnvironmentVariable(REGSTORE_ROOT_VAR.to_string());
        }

        if let Some(key) = lookup(REGSTORE_SAFE_ID_KEY_VAR) {
            config.safe_id_key = key;
            config.source = ConfigSource::EnvironmentVariable(REGSTORE_SAFE_ID_KEY_VAR.to_string());
        }

        if let Some(strategy) = lookup(REGSTORE_UPDATE_STRATEGY_VAR) {
            config.update_strategy = strategy.parse()?;
            config.source =
                ConfigSource::EnvironmentVariable(REGSTORE_UPDATE_STRATEGY_VAR.to_string());
        }

        if let Some(flag) = lookup(REGSTORE_COORDINATE_WRITERS_VAR) {
            config.coordinate_writers = parse_flag(REGSTORE_COORDINATE_WRITERS_VAR, &flag)?;
            config.source =
                ConfigSource::EnvironmentVariable(REGSTORE_COORDINATE_WRITERS_VAR.to_string());
        }

        config.validate()?;
        tracing::debug!(?config, "loaded store configuration");
        Ok(config)
    }

    /// Check the configuration can be used to open a store
    pub fn validate(&self) -> Result<()> {
        if self.safe_id_key.is_empty() {
            return Err(Error::configuration("safe id key must not be empty"));
        }
        if self.root.as_os_str().is_empty() {
            return Err(Error::configuration("storage root must not be empty"));
        }
        Ok(())
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::configuration(format!(
            "{name} must be a boolean, got '{other}'"
        ))),
    }
}

/// Builder for creating store configurations
#[derive(Debug)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: StoreConfig::default(),
        }
    }

    /// Start from an existing configuration
    pub fn from_config(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Set the storage root
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.root = root.into();
        self.config.source = ConfigSource::Builder;
        self
    }

    /// Set the safe id key
    pub fn with_safe_id_key(mut self, key: impl Into<String>) -> Self {
        self.config.safe_id_key = key.into();
        self.config.source = ConfigSource::Builder;
        self
    }

    /// Set the update strategy
    pub fn with_update_strategy(mut self, strategy: UpdateStrategy) -> Self {
        self.config.update_strategy = strategy;
        self.config.source = ConfigSource::Builder;
        self
    }

    /// Enable or disable writer coordination
    pub fn with_coordinate_writers(mut self, coordinate: bool) -> Self {
        self.config.coordinate_writers = coordinate;
        self.config.source = ConfigSource::Builder;
        self
    }

    /// Set configuration source
    pub fn with_source(mut self, source: ConfigSource) -> Self {
        self.config.source = source;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<StoreConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for StoreConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
