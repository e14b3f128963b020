//! Sliding-window drowsiness risk

use crate::event::Event;

/// Ordered events of one track, queried over a trailing time window
#[derive(Debug, Clone, Default)]
pub struct RiskAggregator {
    events: Vec<Event>,
}

impl RiskAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event (arrival order)
    pub fn record(&mut self, event: Event) {
        self.events.push(event);
    }

    /// True iff at least `min_events` events satisfy `now - timestamp <= window`
    pub fn evaluate_risk(&self, now: f64, window: f64, min_events: usize) -> bool {
        self.in_window(now, window).count() >= min_events
    }

    /// Events inside the window, oldest first
    pub fn recent_events(&self, now: f64, window: f64) -> Vec<&Event> {
        self.in_window(now, window).collect()
    }

    /// Drop events older than `horizon` seconds; verdicts for windows up
    /// to `horizon` are unaffected
    pub fn prune(&mut self, now: f64, horizon: f64) {
        self.events.retain(|e| now - e.timestamp <= horizon);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn in_window(&self, now: f64, window: f64) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |e| now - e.timestamp <= window)
    }
}
