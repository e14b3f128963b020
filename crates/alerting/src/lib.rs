//! Alerting System
//!
//! Drives the visual/audio alert side-channel with output hysteresis: an
//! alert stays active for a persistence window after its last trigger.

mod manager;

pub use manager::{AlertConfig, AlertController, AlertSink, AlertState, LogAlertSink};
