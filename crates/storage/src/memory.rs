//! In-memory event log

use dms::Event;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::{debug, info};

use crate::{EventLog, EventRow, StorageError};

/// Event log kept in memory, oldest rows dropped past the retention limit
pub struct MemoryEventLog {
    rows: Mutex<VecDeque<EventRow>>,
    /// Max rows kept
    max_records: usize,
}

impl MemoryEventLog {
    /// Create a new in-memory log
    pub fn new() -> Self {
        Self::with_max_records(100_000)
    }

    pub fn with_max_records(max_records: usize) -> Self {
        info!("Creating in-memory event log (max {} rows)", max_records);
        Self {
            rows: Mutex::new(VecDeque::new()),
            max_records: max_records.max(1),
        }
    }

    /// Get total row count. A poisoned lock still holds valid rows.
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all data (for testing)
    pub fn clear(&self) {
        self.rows.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl Default for MemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog for MemoryEventLog {
    fn append(&self, event: &Event) -> Result<(), StorageError> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;

        // Enforce retention
        while rows.len() >= self.max_records {
            rows.pop_front();
        }

        rows.push_back(EventRow::from(event));
        debug!("Logged {} for session {}", event.event_type, event.session_id);
        Ok(())
    }

    fn rows(&self) -> Result<Vec<EventRow>, StorageError> {
        let rows = self
            .rows
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        Ok(rows.iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dms::EventType;

    fn event(session: &str, event_type: EventType, timestamp: f64) -> Event {
        Event {
            session_id: session.to_string(),
            event_type,
            timestamp,
            metric_value: 0.1,
        }
    }

    #[test]
    fn test_sessions_in_first_appearance_order() {
        let log = MemoryEventLog::new();
        log.append(&event("b", EventType::EyeClosure, 1.0)).unwrap();
        log.append(&event("a", EventType::Yawn, 2.0)).unwrap();
        log.append(&event("b", EventType::Yawn, 3.0)).unwrap();

        assert_eq!(log.list_session_ids().unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn test_events_default_to_latest_session() {
        let log = MemoryEventLog::new();
        assert!(log.events(None).unwrap().is_empty());

        log.append(&event("s1", EventType::EyeClosure, 1.0)).unwrap();
        log.append(&event("s2", EventType::Yawn, 2.0)).unwrap();
        log.append(&event("s2", EventType::EyeClosure, 3.0)).unwrap();

        let latest = log.events(None).unwrap();
        assert_eq!(latest.len(), 2);
        assert!(latest.iter().all(|r| r.session_id == "s2"));

        let first = log.events(Some("s1")).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].event_type, EventType::EyeClosure);

        assert!(log.events(Some("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_retention() {
        let log = MemoryEventLog::with_max_records(2);
        for i in 0..5 {
            log.append(&event("s", EventType::Yawn, i as f64)).unwrap();
        }

        let rows = log.rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].timestamp, 3.0);

        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_len_survives_poisoned_lock() {
        let log = std::sync::Arc::new(MemoryEventLog::new());
        log.append(&event("s", EventType::Yawn, 1.0)).unwrap();

        let poisoner = log.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.rows.lock().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert!(log.rows.is_poisoned());
        assert_eq!(log.len(), 1);
        assert!(!log.is_empty());

        log.clear();
        assert_eq!(log.len(), 0);
    }
}
