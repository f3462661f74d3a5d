//! Configuration management for the orgguard server.
//!
//! Configuration is layered from three sources:
//! 1. Default values (hardcoded)
//! 2. Configuration file (YAML)
//! 3. Environment variables (override)
//!
//! Environment variables take precedence over the file, which takes
//! precedence over defaults.
//!
//! # Example
//!
//! ```ignore
//! use orgguard_server::config::ServerConfig;
//!
//! let config = ServerConfig::load("orgguard.yaml")?;
//! let flags = config.feature_flags();
//! ```

use std::collections::HashMap;
use std::path::Path;

use config::{Config, ConfigError, Environment, File, FileFormat};
use orgguard_domain::flags::KNOWN_FLAGS;
use orgguard_domain::StaticFeatureFlags;
use serde::{Deserialize, Serialize};
use tracing::Level;

/// Default number of events per persisted chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ServerConfig {
    /// Event ingestion settings
    #[serde(default)]
    pub events: EventSettings,

    /// Static feature flag values, keyed by flag name
    #[serde(default)]
    pub flags: HashMap<String, bool>,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Event ingestion settings.
///
/// Overridable through `ORGGUARD_EVENTS__CHUNK_SIZE` and
/// `ORGGUARD_EVENTS__DISPATCH_CONCURRENCY`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EventSettings {
    /// Events per chunk handed to the sink
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Chunks in flight at once
    #[serde(default = "default_dispatch_concurrency")]
    pub dispatch_concurrency: usize,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            dispatch_concurrency: default_dispatch_concurrency(),
        }
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_dispatch_concurrency() -> usize {
    1
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON format (true for production, false for development)
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LoggingSettings {
    /// Most verbose level emitted when `RUST_LOG` is unset.
    ///
    /// Unparseable values fall back to `INFO`; `validate` rejects them first.
    pub fn max_level(&self) -> Level {
        self.level.to_lowercase().parse().unwrap_or(Level::INFO)
    }
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

fn environment() -> Environment {
    // ORGGUARD_EVENTS__CHUNK_SIZE -> events.chunk_size
    Environment::with_prefix("ORGGUARD")
        .prefix_separator("_")
        .separator("__")
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable overrides.
    ///
    /// Environment variables are prefixed with `ORGGUARD_` and use `__` as
    /// the nested key separator.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = Config::builder()
            .add_source(Config::try_from(&ServerConfig::default())?)
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(environment())
            .build()?;

        let server_config: ServerConfig = config.try_deserialize()?;
        server_config.validate()?;

        Ok(server_config)
    }

    /// Load configuration from defaults and environment variables only.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Config::try_from(&ServerConfig::default())?)
            .add_source(environment())
            .build()?;

        let server_config: ServerConfig = config.try_deserialize()?;
        server_config.validate()?;

        Ok(server_config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.events.chunk_size == 0 {
            return Err(ConfigLoadError::Invalid {
                message: "events.chunk_size must be greater than 0".to_string(),
            });
        }

        if self.events.dispatch_concurrency == 0 {
            return Err(ConfigLoadError::Invalid {
                message: "events.dispatch_concurrency must be greater than 0".to_string(),
            });
        }

        if let Some(unknown) = self
            .flags
            .keys()
            .find(|name| !KNOWN_FLAGS.contains(&name.as_str()))
        {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "flags.{unknown} is not a known flag, expected one of: {KNOWN_FLAGS:?}"
                ),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "logging.level must be one of: {:?}, got: {}",
                    valid_levels, self.logging.level
                ),
            });
        }

        Ok(())
    }

    /// Builds the static flag source from the `flags` table.
    pub fn feature_flags(&self) -> StaticFeatureFlags {
        StaticFeatureFlags::new(self.flags.clone())
    }
}
