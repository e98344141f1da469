//! Configuration loading and typed config structures for the Tonyn runtime.
//!
//! The canonical configuration lives in `tonyn-config.yaml` next to the
//! binary's working directory. Every field has a default, so a missing
//! file or an empty document yields a usable configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tonyn_store::{DEFAULT_KEY_PREFIX, StoreOptions};

/// Env var overriding [`StoreConfig::data_dir`].
pub const DATA_DIR_ENV: &str = "TONYN_DATA_DIR";

/// Env var overriding [`StoreConfig::key_prefix`].
pub const KEY_PREFIX_ENV: &str = "TONYN_KEY_PREFIX";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level runtime configuration.
///
/// Mirrors the structure of `tonyn-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TonynConfig {
    /// Where and under which keys state is persisted.
    #[serde(default)]
    pub store: StoreConfig,

    /// Tick loop timing and bounds.
    #[serde(default)]
    pub session: SessionConfig,

    /// Logging output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TonynConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `TONYN_DATA_DIR` overrides `store.data_dir`
    /// - `TONYN_KEY_PREFIX` overrides `store.key_prefix`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Like [`from_file`](Self::from_file), but a missing file yields the
    /// defaults (with env overrides applied).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or
    /// parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let mut config = Self::default();
                config.store.apply_env_overrides();
                Ok(config)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as unit, not as a map.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.store.apply_env_overrides();
        Ok(config)
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one JSON file per persisted key.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Prefix applied to every persisted key.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Merge the built-in starting feed under persisted data at load.
    #[serde(default = "default_true")]
    pub seed_starting_feed: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            key_prefix: default_key_prefix(),
            seed_starting_feed: true,
        }
    }
}

impl StoreConfig {
    /// Apply `TONYN_DATA_DIR` and `TONYN_KEY_PREFIX` from the process
    /// environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup(DATA_DIR_ENV) {
            self.data_dir = PathBuf::from(val);
        }
        if let Some(val) = lookup(KEY_PREFIX_ENV) {
            self.key_prefix = val;
        }
    }

    /// Store options derived from this section.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            key_prefix: self.key_prefix.clone(),
        }
    }
}

/// Tick loop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    /// Milliseconds between sweeps.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Stop after this many ticks (0 = run until stopped).
    #[serde(default)]
    pub max_ticks: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: 0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_owned()
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}
