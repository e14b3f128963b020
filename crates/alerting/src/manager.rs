//! Alert Controller Implementation

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// How long an alert stays active after its last trigger (seconds)
    pub persistence_secs: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            persistence_secs: 1.0,
        }
    }
}

/// Output hysteresis state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertState {
    /// Last time an alert was triggered (monotonic seconds)
    pub last_trigger_time: Option<f64>,
    /// Number of triggers so far
    pub trigger_count: usize,
}

/// Visual/audio alert side-channel
pub trait AlertSink {
    /// Show the alert text on the operator's display
    fn show_overlay(&mut self, reason: &str);

    /// Whether the audio alarm is currently sounding
    fn is_sounding(&self) -> bool;

    /// Start the audio alarm
    fn play(&mut self);

    /// Stop the audio alarm
    fn stop_sound(&mut self);
}

/// Sink that reports alerts through `tracing`; audio is simulated
#[derive(Debug, Default)]
pub struct LogAlertSink {
    sounding: bool,
    plays: usize,
}

impl LogAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times audio was started
    pub fn plays(&self) -> usize {
        self.plays
    }
}

impl AlertSink for LogAlertSink {
    fn show_overlay(&mut self, reason: &str) {
        warn!("{}", reason);
    }

    fn is_sounding(&self) -> bool {
        self.sounding
    }

    fn play(&mut self) {
        info!("Alarm sounding");
        self.sounding = true;
        self.plays += 1;
    }

    fn stop_sound(&mut self) {
        info!("Alarm stopped");
        self.sounding = false;
    }
}

/// Drives the alert side-channel with output hysteresis
pub struct AlertController<S: AlertSink> {
    /// Configuration
    config: AlertConfig,
    /// Hysteresis state
    state: AlertState,
    /// Output side-channel
    sink: S,
}

impl<S: AlertSink> AlertController<S> {
    /// Create a new alert controller
    pub fn new(config: AlertConfig, sink: S) -> Self {
        debug!("Creating alert controller with config: {:?}", config);
        Self {
            config,
            state: AlertState::default(),
            sink,
        }
    }

    /// Show `reason`, start audio unless already sounding, and restart the
    /// persistence window at `now`
    pub fn trigger(&mut self, reason: &str, now: f64) {
        self.sink.show_overlay(reason);
        if !self.sink.is_sounding() {
            self.sink.play();
        }
        self.state.last_trigger_time = Some(now);
        self.state.trigger_count += 1;
    }

    /// Stop audio if it is sounding
    pub fn stop(&mut self) {
        if self.sink.is_sounding() {
            self.sink.stop_sound();
        }
    }

    /// Whether the last trigger is still within the persistence window
    pub fn is_active(&self, now: f64) -> bool {
        self.state
            .last_trigger_time
            .is_some_and(|t| now - t < self.config.persistence_secs)
    }

    pub fn state(&self) -> &AlertState {
        &self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl Default for AlertController<LogAlertSink> {
    fn default() -> Self {
        Self::new(AlertConfig::default(), LogAlertSink::new())
    }
}
