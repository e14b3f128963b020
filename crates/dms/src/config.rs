//! DMS configuration

use serde::{Deserialize, Serialize};
use crate::DmsError;

/// What a detector does after emitting an event while the condition still holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RearmPolicy {
    /// Restart the sustain timer at the emission time; fires every `sustain`
    /// seconds for as long as the condition holds
    #[default]
    Repeating,
    /// Fire once, then stay silent until the condition clears
    Latched,
}

/// How a track's debounce timers treat a frame in which that face was not seen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsencePolicy {
    /// Absence counts as "condition cleared": timers reset
    #[default]
    Reset,
    /// Timers are preserved across dropped frames
    Hold,
}

/// Calibration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Duration of each calibration phase (seconds)
    pub phase_duration_secs: f64,

    /// Capacity of each sample buffer
    pub buffer_capacity: usize,

    /// Blink probe admits EAR samples strictly below this value
    pub blink_admit_ear: f64,

    /// Yawn probe admits MAR samples strictly above this value
    pub yawn_admit_mar: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            phase_duration_secs: 5.0,
            buffer_capacity: 30,
            blink_admit_ear: 0.2,
            yawn_admit_mar: 0.4,
        }
    }
}

/// DMS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// Eyes must stay below the EAR threshold this long to count as closure (seconds)
    pub eye_sustain_secs: f64,

    /// Mouth must stay above the MAR threshold this long to count as a yawn (seconds)
    pub mouth_sustain_secs: f64,

    /// Trailing window for the risk verdict (seconds)
    pub risk_window_secs: f64,

    /// Events inside the window needed to flag risk
    pub risk_min_events: usize,

    /// Detector behaviour while a condition persists past an emission
    pub rearm_policy: RearmPolicy,

    /// Debounce handling for frames where a tracked face is missing
    pub absence_policy: AbsencePolicy,

    /// A track unseen for longer than this is retired (seconds)
    pub track_timeout_secs: f64,

    /// Face match radius as a fraction of the larger bbox side
    pub track_match_ratio: f64,

    /// Calibration settings
    pub calibration: CalibrationConfig,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            eye_sustain_secs: 2.0,
            mouth_sustain_secs: 2.0,
            risk_window_secs: 30.0,
            risk_min_events: 3,
            rearm_policy: RearmPolicy::Repeating,
            absence_policy: AbsencePolicy::Reset,
            track_timeout_secs: 3.0,
            track_match_ratio: 0.5,
            calibration: CalibrationConfig::default(),
        }
    }
}

impl DmsConfig {
    /// Create strict config (lower thresholds)
    pub fn strict() -> Self {
        Self {
            eye_sustain_secs: 1.5,
            mouth_sustain_secs: 1.5,
            risk_min_events: 2,
            ..Default::default()
        }
    }

    /// Create lenient config (higher thresholds)
    pub fn lenient() -> Self {
        Self {
            eye_sustain_secs: 3.0,
            mouth_sustain_secs: 3.0,
            risk_min_events: 4,
            ..Default::default()
        }
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), DmsError> {
        let positive = [
            ("eye_sustain_secs", self.eye_sustain_secs),
            ("mouth_sustain_secs", self.mouth_sustain_secs),
            ("risk_window_secs", self.risk_window_secs),
            ("track_timeout_secs", self.track_timeout_secs),
            ("track_match_ratio", self.track_match_ratio),
            ("calibration.phase_duration_secs", self.calibration.phase_duration_secs),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(DmsError::Config(format!("{} must be positive, got {}", name, value)));
            }
        }
        if self.risk_min_events == 0 {
            return Err(DmsError::Config("risk_min_events must be at least 1".into()));
        }
        if self.calibration.buffer_capacity == 0 {
            return Err(DmsError::Config("calibration.buffer_capacity must be at least 1".into()));
        }
        Ok(())
    }
}
