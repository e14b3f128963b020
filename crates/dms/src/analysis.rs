//! DMS per-frame results and alerts

use feature_engine::FaceFeatures;
use serde::{Deserialize, Serialize};

use crate::calibrator::{CalibrationPhase, CalibrationSummary};
use crate::event::{Event, EventType};
use crate::tracking::{FaceRegion, TrackId};

/// DMS alert types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DmsAlert {
    /// Sustained eye closure just completed
    EyesClosed,

    /// Sustained mouth opening just completed
    Yawn,

    /// Enough events in the risk window: driver is drowsy
    Drowsiness,
}

impl DmsAlert {
    /// Operator-facing overlay text
    pub fn reason(&self) -> &'static str {
        match self {
            DmsAlert::EyesClosed => "ALERT: EYES CLOSED!",
            DmsAlert::Yawn => "YAWN DETECTED!",
            DmsAlert::Drowsiness => "ALERT: DROWSY DRIVER",
        }
    }
}

impl From<EventType> for DmsAlert {
    fn from(event_type: EventType) -> Self {
        match event_type {
            EventType::EyeClosure => DmsAlert::EyesClosed,
            EventType::Yawn => DmsAlert::Yawn,
        }
    }
}

/// Signals for one face in one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceReport {
    pub track: TrackId,
    pub region: FaceRegion,
    pub features: FaceFeatures,
}

/// Detection-phase result for one frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionReport {
    /// Frame time (monotonic seconds)
    pub timestamp: f64,

    /// Faces observed this frame
    pub faces: Vec<FaceReport>,

    /// Events emitted this frame, in face order
    pub events: Vec<Event>,

    /// Tracks whose risk window is over the event limit
    pub at_risk: Vec<TrackId>,

    /// Largest per-track event count inside the risk window
    pub recent_event_count: usize,

    /// Active alerts
    pub alerts: Vec<DmsAlert>,
}

impl DetectionReport {
    /// Whether any tracked face is at risk
    pub fn risk(&self) -> bool {
        !self.at_risk.is_empty()
    }

    /// Get highest severity alert
    pub fn highest_severity_alert(&self) -> Option<DmsAlert> {
        // Priority: Drowsiness > EyesClosed > Yawn
        [DmsAlert::Drowsiness, DmsAlert::EyesClosed, DmsAlert::Yawn]
            .into_iter()
            .find(|alert| self.alerts.contains(alert))
    }
}

/// What a frame produced
#[derive(Debug, Clone, Serialize)]
pub enum FrameOutcome {
    /// Still collecting calibration samples
    Calibrating {
        phase: CalibrationPhase,
        instructions: &'static str,
        /// (current phase number, total phases)
        progress: (usize, usize),
    },

    /// Calibration finished on this frame; detection starts with the next one
    CalibrationFinished(CalibrationSummary),

    /// Detection result
    Detection(DetectionReport),
}

impl FrameOutcome {
    pub fn detection(&self) -> Option<&DetectionReport> {
        match self {
            FrameOutcome::Detection(report) => Some(report),
            _ => None,
        }
    }
}
