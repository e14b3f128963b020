//! Per-face driver state

use feature_engine::FaceFeatures;

use crate::calibrator::ThresholdPair;
use crate::config::{AbsencePolicy, DmsConfig};
use crate::detector::EventDetector;
use crate::event::{Event, SessionContext, Signal, SignalKind};
use crate::risk::RiskAggregator;

/// Debounce and risk state owned by exactly one tracked face
#[derive(Debug, Clone)]
pub struct TrackState {
    pub eye: EventDetector,
    pub mouth: EventDetector,
    pub risk: RiskAggregator,
}

impl TrackState {
    pub fn new(config: &DmsConfig, session: &SessionContext) -> Self {
        Self {
            eye: EventDetector::eye(config.eye_sustain_secs, config.rearm_policy, session),
            mouth: EventDetector::mouth(config.mouth_sustain_secs, config.rearm_policy, session),
            risk: RiskAggregator::new(),
        }
    }

    /// Run both detectors on this frame's features. A missing signal leaves
    /// its detector untouched.
    pub fn observe(
        &mut self,
        features: &FaceFeatures,
        thresholds: &ThresholdPair,
        now: f64,
    ) -> Vec<Event> {
        let mut events = Vec::new();

        if let Some(value) = features.ear {
            let signal = Signal {
                kind: SignalKind::Eye,
                value,
                timestamp: now,
            };
            events.extend(self.eye.observe(&signal, thresholds.ear_threshold));
        }
        if let Some(value) = features.mar {
            let signal = Signal {
                kind: SignalKind::Mouth,
                value,
                timestamp: now,
            };
            events.extend(self.mouth.observe(&signal, thresholds.mar_threshold));
        }

        for event in &events {
            self.risk.record(event.clone());
        }
        events
    }

    /// Face not seen this frame
    pub fn mark_absent(&mut self, policy: AbsencePolicy) {
        if policy == AbsencePolicy::Reset {
            self.eye.reset();
            self.mouth.reset();
        }
    }
}
