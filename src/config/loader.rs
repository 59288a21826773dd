use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::config::types::EngineConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl EngineConfig {
    /// Returns the path to the configuration file.
    ///
    /// `~/.config/widgetbind/config.toml` on Linux, the platform equivalent
    /// elsewhere; the current directory if no config dir is known.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("widgetbind").join("config.toml")
    }

    /// Loads configuration from the default config file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from `path`.
    ///
    /// A missing file yields the defaults; an existing file must parse and
    /// validate.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(EngineConfig::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: EngineConfig = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - the action timeout is non-zero
    /// - a trigger may run at least one action
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.actions.timeout_ms == 0 {
            return Err(ConfigError::ValidationError {
                message: "actions.timeout_ms must be greater than zero".to_string(),
            });
        }
        if self.actions.max_actions == 0 {
            return Err(ConfigError::ValidationError {
                message: "actions.max_actions must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
