//! Storage Layer
//!
//! Append-only event log shared across sessions, with the two read
//! operations the dashboard needs: list sessions and fetch a session's rows.

mod csv_log;
mod log;
mod memory;
mod settings;

pub use csv_log::{CsvEventLog, CSV_HEADER};
pub use log::{EventLog, EventRow};
pub use memory::MemoryEventLog;
pub use settings::StorageSettings;

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed event log: {0}")]
    Malformed(String),
    #[error("Lock error: {0}")]
    Lock(String),
}

impl From<csv::Error> for StorageError {
    fn from(err: csv::Error) -> Self {
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(e) => StorageError::Io(e),
            _ => StorageError::Malformed(message),
        }
    }
}
