//! CSV-backed event log

use dms::Event;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{EventLog, EventRow, StorageError};

/// Fixed column header of the log file
pub const CSV_HEADER: [&str; 4] = ["session_id", "timestamp", "event_type", "metric_value"];

/// Event log stored as a single CSV file shared by every session
pub struct CsvEventLog {
    path: PathBuf,
    /// Serializes appends from this process
    write_lock: Mutex<()>,
}

impl CsvEventLog {
    /// Handle on `path` without touching the disk. Reads of a log that does
    /// not exist yet return nothing.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Prepare `path` for appending: create missing directories, write the
    /// header into a new or empty file, and warn if an existing header differs.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let log = Self::new(path);

        if let Some(parent) = log.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log.path)?;

        if file.metadata()?.len() == 0 {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(file);
            writer.write_record(CSV_HEADER)?;
            writer.flush()?;
            info!("Created event log at {}", log.path.display());
        } else {
            log.check_header()?;
            info!("Appending to event log at {}", log.path.display());
        }

        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn check_header(&self) -> Result<(), StorageError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)?;

        if let Some(first) = reader.records().next() {
            let first = first?;
            if !first.iter().eq(CSV_HEADER.iter().copied()) {
                warn!(
                    "Event log {} has unexpected header {:?}; appending anyway",
                    self.path.display(),
                    first
                );
            }
        }
        Ok(())
    }
}

impl EventLog for CsvEventLog {
    fn append(&self, event: &Event) -> Result<(), StorageError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let empty = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if empty {
            writer.write_record(CSV_HEADER)?;
        }
        writer.serialize(EventRow::from(event))?;
        writer.flush()?;

        debug!("Logged {} at {:.3}", event.event_type, event.timestamp);
        Ok(())
    }

    fn rows(&self) -> Result<Vec<EventRow>, StorageError> {
        let mut reader = match csv::ReaderBuilder::new().from_path(&self.path) {
            Ok(reader) => reader,
            Err(e)
                if matches!(e.kind(), csv::ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::NotFound) =>
            {
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        reader
            .deserialize()
            .collect::<Result<Vec<EventRow>, _>>()
            .map_err(StorageError::from)
    }
}
