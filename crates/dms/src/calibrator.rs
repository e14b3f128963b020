//! Person-specific threshold calibration
//!
//! Three timed phases collect EAR/MAR samples: a resting baseline, a blink
//! probe and a yawn probe. Thresholds are derived from the baseline only;
//! the probe buffers are kept to report whether the driver followed the
//! prompts.

use feature_engine::{percentile, StatisticalFeatures};
use ring_buffer::RingBuffer;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::CalibrationConfig;

const DEFAULT_EAR_THRESHOLD: f64 = 0.25;
const DEFAULT_MAR_THRESHOLD: f64 = 0.50;
const EAR_BOUNDS: (f64, f64) = (0.15, 0.30);
const MAR_BOUNDS: (f64, f64) = (0.30, 0.70);

/// Calibration phase, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CalibrationPhase {
    /// Eyes open, mouth closed
    Baseline,
    /// Blink a few times
    BlinkProbe,
    /// Yawn
    YawnProbe,
    /// Terminal
    Done,
}

impl CalibrationPhase {
    /// Number of data-collecting phases
    pub const COUNT: usize = 3;

    fn next(self) -> Self {
        match self {
            CalibrationPhase::Baseline => CalibrationPhase::BlinkProbe,
            CalibrationPhase::BlinkProbe => CalibrationPhase::YawnProbe,
            CalibrationPhase::YawnProbe | CalibrationPhase::Done => CalibrationPhase::Done,
        }
    }

    /// 1-based phase number, capped at `COUNT`
    pub fn number(self) -> usize {
        match self {
            CalibrationPhase::Baseline => 1,
            CalibrationPhase::BlinkProbe => 2,
            CalibrationPhase::YawnProbe | CalibrationPhase::Done => 3,
        }
    }

    /// Operator prompt for this phase
    pub fn instructions(self) -> &'static str {
        match self {
            CalibrationPhase::Baseline => "Keep eyes open and mouth closed",
            CalibrationPhase::BlinkProbe => "Blink 3 times normally",
            CalibrationPhase::YawnProbe => "Yawn (if you can)",
            CalibrationPhase::Done => "Calibration complete!",
        }
    }
}

/// Detection thresholds for one session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPair {
    /// EAR below this means eyes closing
    pub ear_threshold: f64,
    /// MAR above this means mouth opening
    pub mar_threshold: f64,
}

impl Default for ThresholdPair {
    fn default() -> Self {
        Self {
            ear_threshold: DEFAULT_EAR_THRESHOLD,
            mar_threshold: DEFAULT_MAR_THRESHOLD,
        }
    }
}

/// Thresholds plus what each phase captured
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationSummary {
    pub thresholds: ThresholdPair,
    pub baseline_ear: StatisticalFeatures,
    pub baseline_mar: StatisticalFeatures,
    pub blink_samples: usize,
    pub yawn_samples: usize,
}

/// Timed calibration state machine
#[derive(Debug, Clone)]
pub struct Calibrator {
    config: CalibrationConfig,
    phase: CalibrationPhase,
    phase_start: f64,
    baseline_ear: RingBuffer<f64>,
    baseline_mar: RingBuffer<f64>,
    blink_ear: RingBuffer<f64>,
    yawn_mar: RingBuffer<f64>,
}

impl Calibrator {
    /// Start calibrating at `now` (monotonic seconds)
    pub fn new(config: CalibrationConfig, now: f64) -> Self {
        let capacity = config.buffer_capacity;
        info!(
            "Calibration started: {} phases of {:.1}s",
            CalibrationPhase::COUNT,
            config.phase_duration_secs
        );
        Self {
            config,
            phase: CalibrationPhase::Baseline,
            phase_start: now,
            baseline_ear: RingBuffer::new(capacity),
            baseline_mar: RingBuffer::new(capacity),
            blink_ear: RingBuffer::new(capacity),
            yawn_mar: RingBuffer::new(capacity),
        }
    }

    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == CalibrationPhase::Done
    }

    /// Prompt for the current phase
    pub fn instructions(&self) -> &'static str {
        self.phase.instructions()
    }

    /// `(current phase number, total phases)` for display
    pub fn progress(&self) -> (usize, usize) {
        (self.phase.number(), CalibrationPhase::COUNT)
    }

    /// Advance at most one phase if the current one has run its duration.
    /// Returns the phase after the tick.
    pub fn tick(&mut self, now: f64) -> CalibrationPhase {
        if self.is_done() {
            return self.phase;
        }
        if now - self.phase_start >= self.config.phase_duration_secs {
            let next = self.phase.next();
            debug!("Calibration phase {:?} -> {:?} at t={:.3}", self.phase, next, now);
            self.phase = next;
            self.phase_start = now;
            if self.is_done() {
                info!(
                    "Calibration sampling complete (baseline={}, blink={}, yawn={})",
                    self.baseline_ear.len(),
                    self.blink_ear.len(),
                    self.yawn_mar.len()
                );
            }
        }
        self.phase
    }

    /// Offer one (EAR, MAR) sample to the current phase
    pub fn add_sample(&mut self, ear: f64, mar: f64) {
        match self.phase {
            CalibrationPhase::Baseline => {
                self.baseline_ear.push(ear);
                self.baseline_mar.push(mar);
            }
            CalibrationPhase::BlinkProbe if ear < self.config.blink_admit_ear => {
                self.blink_ear.push(ear);
            }
            CalibrationPhase::YawnProbe if mar > self.config.yawn_admit_mar => {
                self.yawn_mar.push(mar);
            }
            _ => {}
        }
    }

    /// Derive thresholds from the baseline. Never fails: missing or
    /// non-finite inputs fall back to the defaults (EAR 0.25, MAR 0.50).
    pub fn finalize(&self) -> ThresholdPair {
        let ear = derive(
            &self.baseline_ear.to_vec(),
            25.0,
            0.8,
            EAR_BOUNDS,
            DEFAULT_EAR_THRESHOLD,
        );
        let mar = derive(
            &self.baseline_mar.to_vec(),
            75.0,
            1.8,
            MAR_BOUNDS,
            DEFAULT_MAR_THRESHOLD,
        );
        ThresholdPair {
            ear_threshold: ear,
            mar_threshold: mar,
        }
    }

    /// Thresholds plus per-phase capture report
    pub fn summary(&self) -> CalibrationSummary {
        if self.baseline_ear.is_empty() {
            warn!("Baseline captured no samples; using default thresholds");
        }
        if self.blink_ear.is_empty() {
            warn!("Blink probe captured no closed-eye samples");
        }
        if self.yawn_mar.is_empty() {
            warn!("Yawn probe captured no open-mouth samples");
        }
        CalibrationSummary {
            thresholds: self.finalize(),
            baseline_ear: StatisticalFeatures::compute(&self.baseline_ear.to_vec()),
            baseline_mar: StatisticalFeatures::compute(&self.baseline_mar.to_vec()),
            blink_samples: self.blink_ear.len(),
            yawn_samples: self.yawn_mar.len(),
        }
    }
}

fn derive(samples: &[f64], pct: f64, scale: f64, (lo, hi): (f64, f64), default: f64) -> f64 {
    match percentile(samples, pct).map(|p| p * scale) {
        Some(value) if value.is_finite() => value.clamp(lo, hi),
        _ => default,
    }
}
