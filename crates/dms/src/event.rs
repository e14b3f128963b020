//! Sessions, signals and drowsiness events

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of one monitoring run, handed to every component at creation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: String,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
        }
    }

    /// New session named after the current UTC time plus a random suffix,
    /// e.g. `20261019-081502-3f2a9c1d`
    pub fn generate() -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self::new(format!(
            "{}-{}",
            Utc::now().format("%Y%m%d-%H%M%S"),
            &suffix[..8]
        ))
    }
}

impl fmt::Display for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.session_id)
    }
}

/// Source of a scalar signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// Eye aspect ratio
    Eye,
    /// Mouth aspect ratio
    Mouth,
}

impl SignalKind {
    /// Event type produced by a sustained crossing of this signal
    pub fn event_type(self) -> EventType {
        match self {
            SignalKind::Eye => EventType::EyeClosure,
            SignalKind::Mouth => EventType::Yawn,
        }
    }
}

/// One scalar reading for one face in one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub value: f64,
    /// Monotonic seconds
    pub timestamp: f64,
}

/// Drowsiness event type
///
/// Stored with stable snake_case tags; the legacy tags `olhos` and `bocejo`
/// are still accepted when reading old logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "eye_closure", alias = "olhos")]
    EyeClosure,
    #[serde(rename = "yawn", alias = "bocejo")]
    Yawn,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::EyeClosure => "eye_closure",
            EventType::Yawn => "yawn",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A debounced drowsiness event; immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub session_id: String,
    pub event_type: EventType,
    pub timestamp: f64,
    pub metric_value: f64,
}
