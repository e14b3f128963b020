//! Event log location

use serde::Deserialize;
use std::path::PathBuf;

/// Where the shared event log lives
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub log_path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("reports/all_sessions_data.csv"),
        }
    }
}
