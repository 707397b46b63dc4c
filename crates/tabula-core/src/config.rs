//! `Tabula` Configuration Module
//!
//! Provides configuration file support via `tabula.toml`, environment
//! variables, and runtime overrides.
//!
//! # Priority (highest to lowest)
//!
//! 1. Runtime overrides (builder methods on `Table`, `FilterIteratorFactory`)
//! 2. Environment variables (`TABULA_*`, sections separated by `__`,
//!    e.g. `TABULA_FILTER__OPTIMIZE_THRESHOLD=500`)
//! 3. Configuration file (`tabula.toml`)
//! 4. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::comparator::LiteralComparator;

/// Row count below which predicates are always evaluated by a linear scan.
pub const DEFAULT_OPTIMIZE_THRESHOLD: usize = 300;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key that failed validation.
        key: String,
        /// Validation error message.
        message: String,
    },

    /// Failed to serialize configuration.
    #[error("Failed to serialize configuration: {0}")]
    SerializeError(String),
}

/// Predicate planning configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Tables with fewer rows than this are always scanned.
    pub optimize_threshold: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            optimize_threshold: DEFAULT_OPTIMIZE_THRESHOLD,
        }
    }
}

/// Index configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Comparator used by `Table::create_index`.
    pub default_comparator: LiteralComparator,
    /// Columns indexed automatically as soon as they are added to a table.
    pub auto_index_columns: Vec<String>,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive: error, warn, info, debug, trace.
    pub level: String,
    /// Log format: text or compact.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Main `Tabula` configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TabulaConfig {
    /// Predicate planning configuration.
    pub filter: FilterConfig,
    /// Index configuration.
    pub index: IndexConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl TabulaConfig {
    /// Loads configuration from default sources.
    ///
    /// Priority: defaults < file < environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("tabula.toml")
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("TABULA_").split("__"));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Creates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        let level = self.logging.level.to_lowercase();
        if !level.contains('=') && !valid_levels.contains(&level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                message: format!(
                    "value '{}' is invalid, expected one of: {valid_levels:?} or a filter directive",
                    self.logging.level
                ),
            });
        }

        let valid_formats = ["text", "compact"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                message: format!(
                    "value '{}' is invalid, expected one of: {valid_formats:?}",
                    self.logging.format
                ),
            });
        }

        if let Some(blank) = self
            .index
            .auto_index_columns
            .iter()
            .find(|c| c.trim().is_empty())
        {
            return Err(ConfigError::InvalidValue {
                key: "index.auto_index_columns".to_string(),
                message: format!("column name '{blank}' is empty"),
            });
        }

        Ok(())
    }

    /// Serializes the configuration to a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }
}
