//! Layered settings: defaults, optional `drowsiness.toml`, `DROWSY__*` env

use config::{Config, ConfigError, Environment, File};
use serde::{de::DeserializeOwned, Deserialize};
use std::path::Path;
use storage::StorageSettings;

/// Settings file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "drowsiness";

/// Environment prefix, e.g. `DROWSY__DASHBOARD__BIND_ADDR`
pub const ENV_PREFIX: &str = "DROWSY";

/// Load any settings struct from the layered sources. An explicit `file`
/// must exist; the default one is optional.
pub fn load_settings<T: DeserializeOwned>(file: Option<&Path>) -> Result<T, ConfigError> {
    let builder = match file {
        Some(path) => Config::builder().add_source(File::from(path)),
        None => Config::builder().add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
    };

    builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Max level: trace, debug, info, warn or error
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    pub bind_addr: String,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
        }
    }
}

/// Dashboard binary settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub storage: StorageSettings,
    pub dashboard: DashboardSettings,
}

impl Settings {
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        load_settings(file)
    }
}
