//! Event log contract

use dms::{Event, EventType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::StorageError;

/// One persisted event, column order matches the CSV header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRow {
    pub session_id: String,
    pub timestamp: f64,
    pub event_type: EventType,
    pub metric_value: f64,
}

impl From<&Event> for EventRow {
    fn from(event: &Event) -> Self {
        Self {
            session_id: event.session_id.clone(),
            timestamp: event.timestamp,
            event_type: event.event_type,
            metric_value: event.metric_value,
        }
    }
}

/// Append-only log shared across sessions
pub trait EventLog: Send + Sync {
    /// Append one event
    fn append(&self, event: &Event) -> Result<(), StorageError>;

    /// Every row in arrival order. A log that does not exist yet is empty.
    fn rows(&self) -> Result<Vec<EventRow>, StorageError>;

    /// Distinct session ids in order of first appearance
    fn list_session_ids(&self) -> Result<Vec<String>, StorageError> {
        let mut seen = HashSet::new();
        Ok(self
            .rows()?
            .into_iter()
            .filter(|row| seen.insert(row.session_id.clone()))
            .map(|row| row.session_id)
            .collect())
    }

    /// Rows for `session_id`, or for the session of the last row when absent
    fn events(&self, session_id: Option<&str>) -> Result<Vec<EventRow>, StorageError> {
        let rows = self.rows()?;
        let target = match session_id {
            Some(id) => id.to_string(),
            None => match rows.last() {
                Some(row) => row.session_id.clone(),
                None => return Ok(Vec::new()),
            },
        };

        Ok(rows
            .into_iter()
            .filter(|row| row.session_id == target)
            .collect())
    }
}
