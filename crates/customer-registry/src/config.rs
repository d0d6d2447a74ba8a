//! Configuration management for the customer registry.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "customer-registry";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "registry.db";

/// Storage key the record blob lives under.
pub const DEFAULT_STORAGE_KEY: &str = "clientes";

/// Placeholder replaced by the 8-digit postal code in the endpoint template.
pub const POSTAL_CODE_PLACEHOLDER: &str = "{cep}";

/// Default postal lookup endpoint.
pub const DEFAULT_LOOKUP_ENDPOINT: &str = "https://viacep.com.br/ws/{cep}/json/";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `CUSTREG_`, sections nested with
///    `__`, e.g. `CUSTREG_LOOKUP__TIMEOUT_SECS`)
/// 2. TOML config file at `~/.config/customer-registry/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Postal lookup configuration.
    pub lookup: LookupConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/customer-registry/registry.db`
    pub database_path: Option<PathBuf>,
    /// Key of the slot holding the serialized records.
    pub storage_key: String,
}

/// Postal lookup configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Run the lookup when a postal code is entered.
    pub enabled: bool,
    /// Endpoint template; `{cep}` is replaced by the 8-digit code.
    pub endpoint: String,
    /// Request timeout in seconds. 0 disables the timeout.
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_LOOKUP_ENDPOINT.to_string(),
            timeout_secs: 15,
        }
    }
}

impl LookupConfig {
    /// Request timeout, or `None` when `timeout_secs` is 0.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("CUSTREG_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.storage.storage_key.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "storage_key must not be empty".to_string(),
            });
        }

        if !self.lookup.endpoint.contains(POSTAL_CODE_PLACEHOLDER) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "lookup endpoint must contain the {POSTAL_CODE_PLACEHOLDER} placeholder: {}",
                    self.lookup.endpoint
                ),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

}
