//! Sustained-crossing debounce: signal stream -> discrete events

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RearmPolicy;
use crate::event::{Event, SessionContext, Signal, SignalKind};

/// Side of the threshold that counts as the condition holding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// `value > threshold` (mouth opening)
    Above,
    /// `value < threshold` (eyes closing)
    Below,
}

impl Direction {
    pub fn holds(self, value: f64, threshold: f64) -> bool {
        match self {
            Direction::Above => value > threshold,
            Direction::Below => value < threshold,
        }
    }
}

/// Crossing timer for one signal of one face
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebounceTimer {
    /// When the current uninterrupted crossing started
    pub crossing_start: Option<f64>,
    /// Set after a latched emission until the condition clears
    latched: bool,
    policy: RearmPolicy,
}

impl DebounceTimer {
    pub fn new(policy: RearmPolicy) -> Self {
        Self {
            crossing_start: None,
            latched: false,
            policy,
        }
    }

    /// Feed one reading; returns true when a sustained crossing completes
    pub fn observe(
        &mut self,
        value: f64,
        threshold: f64,
        now: f64,
        direction: Direction,
        sustain: f64,
    ) -> bool {
        if !direction.holds(value, threshold) {
            self.reset();
            return false;
        }
        if self.latched {
            return false;
        }

        match self.crossing_start {
            None => {
                self.crossing_start = Some(now);
                false
            }
            Some(start) if now - start >= sustain => {
                match self.policy {
                    RearmPolicy::Repeating => self.crossing_start = Some(now),
                    RearmPolicy::Latched => {
                        self.crossing_start = None;
                        self.latched = true;
                    }
                }
                true
            }
            Some(_) => false,
        }
    }

    /// Forget any in-progress crossing and clear a latch
    pub fn reset(&mut self) {
        self.crossing_start = None;
        self.latched = false;
    }

    pub fn is_tracking(&self) -> bool {
        self.crossing_start.is_some()
    }
}

/// Debounced event source for one signal kind of one tracked face
#[derive(Debug, Clone)]
pub struct EventDetector {
    kind: SignalKind,
    direction: Direction,
    sustain: f64,
    session_id: String,
    timer: DebounceTimer,
}

impl EventDetector {
    pub fn new(
        kind: SignalKind,
        direction: Direction,
        sustain: f64,
        policy: RearmPolicy,
        session: &SessionContext,
    ) -> Self {
        Self {
            kind,
            direction,
            sustain,
            session_id: session.session_id.clone(),
            timer: DebounceTimer::new(policy),
        }
    }

    /// Eye closure detector: EAR below threshold
    pub fn eye(sustain: f64, policy: RearmPolicy, session: &SessionContext) -> Self {
        Self::new(SignalKind::Eye, Direction::Below, sustain, policy, session)
    }

    /// Yawn detector: MAR above threshold
    pub fn mouth(sustain: f64, policy: RearmPolicy, session: &SessionContext) -> Self {
        Self::new(SignalKind::Mouth, Direction::Above, sustain, policy, session)
    }

    pub fn kind(&self) -> SignalKind {
        self.kind
    }

    /// Feed one signal reading; emits an event when the crossing has been
    /// sustained
    pub fn observe(&mut self, signal: &Signal, threshold: f64) -> Option<Event> {
        debug_assert_eq!(signal.kind, self.kind);
        let fired = self.timer.observe(
            signal.value,
            threshold,
            signal.timestamp,
            self.direction,
            self.sustain,
        );
        if !fired {
            return None;
        }

        let event_type = self.kind.event_type();
        debug!(
            "{} event at t={:.3} (value={:.3}, threshold={:.3})",
            event_type, signal.timestamp, signal.value, threshold
        );
        Some(Event {
            session_id: self.session_id.clone(),
            event_type,
            timestamp: signal.timestamp,
            metric_value: signal.value,
        })
    }

    /// Treat this frame as "condition cleared"
    pub fn reset(&mut self) {
        self.timer.reset();
    }

    pub fn timer(&self) -> &DebounceTimer {
        &self.timer
    }
}
