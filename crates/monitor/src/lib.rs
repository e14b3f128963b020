//! Drowsiness Monitor
//!
//! Wires the DMS pipeline to its collaborators: a landmark provider feeds
//! frames in, alerts and the event log take results out.

mod replay;
mod runner;
pub mod settings;

pub use replay::{RecordedFrame, ReplayProvider};
pub use runner::{Monitor, RunStats, StopFlag};
pub use settings::{LoopSettings, MonitorSettings};

use dms::{DmsError, FaceRegion};
use std::path::PathBuf;
use storage::StorageError;
use thiserror::Error;

/// Monitor errors
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("DMS error: {0}")]
    Dms(#[from] DmsError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Cannot open {}: {source}", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bad replay frame on line {line}: {source}")]
    Replay {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("No landmarks recorded for face region {0:?}")]
    UnknownRegion(FaceRegion),

    #[error("Landmark provider failed: {0}")]
    Provider(String),
}
