//! Driver Monitoring System (DMS)
//!
//! Frame-synchronous drowsiness detection from facial landmarks:
//! - Person-specific threshold calibration
//! - Eye closure and yawn debouncing
//! - Sliding-window drowsiness risk
//! - Per-face state keyed by track
//!
//! Time is passed in explicitly with every frame; nothing here reads a clock.

pub mod analysis;
pub mod calibrator;
pub mod config;
pub mod detector;
pub mod event;
pub mod provider;
pub mod risk;
pub mod state;
pub mod tracking;

pub use analysis::{DetectionReport, DmsAlert, FaceReport, FrameOutcome};
pub use calibrator::{CalibrationPhase, CalibrationSummary, Calibrator, ThresholdPair};
pub use config::{AbsencePolicy, CalibrationConfig, DmsConfig, RearmPolicy};
pub use detector::{DebounceTimer, Direction, EventDetector};
pub use event::{Event, EventType, SessionContext, Signal, SignalKind};
pub use provider::{FaceObservation, LandmarkProvider};
pub use risk::RiskAggregator;
pub use state::TrackState;
pub use tracking::{FaceRegion, FaceTracker, TrackId};

use feature_engine::{FeatureError, FeatureExtractor};
use std::collections::HashMap;
use thiserror::Error;
use tracing::info;

/// DMS error types
#[derive(Error, Debug)]
pub enum DmsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid landmarks: {0}")]
    Landmarks(#[from] FeatureError),
}

enum Mode {
    /// Calibration starts with the first frame's time
    AwaitingFirstFrame,
    Calibrating(Calibrator),
    Detecting(ThresholdPair),
}

/// Driver monitoring module
pub struct DmsModule {
    config: DmsConfig,
    session: SessionContext,
    extractor: FeatureExtractor,
    mode: Mode,
    tracker: FaceTracker,
    tracks: HashMap<TrackId, TrackState>,
}

impl DmsModule {
    /// Create a module that calibrates first. The calibration clock starts
    /// at the time of the first processed frame.
    pub fn new(config: DmsConfig, session: SessionContext) -> Result<Self, DmsError> {
        config.validate()?;
        Ok(Self::build(config, session, Mode::AwaitingFirstFrame))
    }

    /// Create a module that skips calibration and detects with fixed thresholds
    pub fn with_thresholds(
        config: DmsConfig,
        session: SessionContext,
        thresholds: ThresholdPair,
    ) -> Result<Self, DmsError> {
        config.validate()?;
        info!(
            "Detection thresholds - EAR: {:.2}, MAR: {:.2}",
            thresholds.ear_threshold, thresholds.mar_threshold
        );
        Ok(Self::build(config, session, Mode::Detecting(thresholds)))
    }

    fn build(config: DmsConfig, session: SessionContext, mode: Mode) -> Self {
        Self {
            tracker: FaceTracker::new(config.track_match_ratio),
            extractor: FeatureExtractor::new(),
            tracks: HashMap::new(),
            config,
            session,
            mode,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn config(&self) -> &DmsConfig {
        &self.config
    }

    pub fn is_calibrating(&self) -> bool {
        matches!(self.mode, Mode::AwaitingFirstFrame | Mode::Calibrating(_))
    }

    /// Active thresholds once calibration is over
    pub fn thresholds(&self) -> Option<ThresholdPair> {
        match &self.mode {
            Mode::Detecting(pair) => Some(*pair),
            Mode::AwaitingFirstFrame | Mode::Calibrating(_) => None,
        }
    }

    /// Number of live face tracks
    pub fn active_tracks(&self) -> usize {
        self.tracks.len()
    }

    /// Run one frame through the pipeline
    pub fn process_frame(&mut self, now: f64, faces: &[FaceObservation]) -> FrameOutcome {
        match &mut self.mode {
            Mode::AwaitingFirstFrame => {
                self.mode = Mode::Calibrating(Calibrator::new(self.config.calibration.clone(), now));
                self.process_frame(now, faces)
            }
            Mode::Calibrating(calibrator) => {
                let phase = calibrator.tick(now);
                if calibrator.is_done() {
                    let summary = calibrator.summary();
                    info!(
                        "Calibrated thresholds - EAR: {:.2}, MAR: {:.2}",
                        summary.thresholds.ear_threshold, summary.thresholds.mar_threshold
                    );
                    self.mode = Mode::Detecting(summary.thresholds);
                    return FrameOutcome::CalibrationFinished(summary);
                }

                // Only an unambiguous single face calibrates
                if let [face] = faces {
                    let features = self.extractor.extract(&face.landmarks);
                    if let (Some(ear), Some(mar)) = (features.ear, features.mar) {
                        calibrator.add_sample(ear, mar);
                    }
                }

                FrameOutcome::Calibrating {
                    phase,
                    instructions: calibrator.instructions(),
                    progress: calibrator.progress(),
                }
            }
            Mode::Detecting(thresholds) => {
                let thresholds = *thresholds;
                FrameOutcome::Detection(self.detect(now, faces, &thresholds))
            }
        }
    }

    fn detect(
        &mut self,
        now: f64,
        faces: &[FaceObservation],
        thresholds: &ThresholdPair,
    ) -> DetectionReport {
        let regions: Vec<FaceRegion> = faces.iter().map(|f| f.region).collect();
        let ids = self.tracker.assign(&regions, now);

        let mut report = DetectionReport {
            timestamp: now,
            ..Default::default()
        };

        for (id, face) in ids.iter().zip(faces) {
            let track = self
                .tracks
                .entry(*id)
                .or_insert_with(|| TrackState::new(&self.config, &self.session));
            let features = self.extractor.extract(&face.landmarks);
            let events = track.observe(&features, thresholds, now);

            for event in &events {
                metrics::counter!("dms_events_total", "kind" => event.event_type.as_str())
                    .increment(1);
                report.alerts.push(DmsAlert::from(event.event_type));
            }
            report.events.extend(events);
            report.faces.push(FaceReport {
                track: *id,
                region: face.region,
                features,
            });
        }

        for (id, track) in self.tracks.iter_mut() {
            if !ids.contains(id) {
                track.mark_absent(self.config.absence_policy);
            }
        }
        for id in self.tracker.retire(now, self.config.track_timeout_secs) {
            self.tracks.remove(&id);
        }

        let window = self.config.risk_window_secs;
        for (id, track) in self.tracks.iter_mut() {
            track.risk.prune(now, window);
            let recent = track.risk.recent_events(now, window).len();
            report.recent_event_count = report.recent_event_count.max(recent);
            if track.risk.evaluate_risk(now, window, self.config.risk_min_events) {
                report.at_risk.push(*id);
            }
        }
        report.at_risk.sort();
        if report.risk() {
            report.alerts.push(DmsAlert::Drowsiness);
        }

        metrics::gauge!("dms_active_tracks").set(self.tracks.len() as f64);
        report
    }

    /// Drop all per-face state (on driver change); thresholds are kept
    pub fn reset_state(&mut self) {
        self.tracks.clear();
        self.tracker = FaceTracker::new(self.config.track_match_ratio);
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{face, face_at};
    use super::*;

    const FRAME: f64 = 0.125;

    fn detecting(config: DmsConfig) -> DmsModule {
        DmsModule::with_thresholds(config, SessionContext::new("s1"), ThresholdPair::default())
            .unwrap()
    }

    fn run(module: &mut DmsModule, start: f64, end: f64, faces: &[FaceObservation]) -> Vec<DetectionReport> {
        let steps = ((end - start) / FRAME).round() as usize;
        (0..=steps)
            .filter_map(|i| {
                module
                    .process_frame(start + i as f64 * FRAME, faces)
                    .detection()
                    .cloned()
            })
            .collect()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = DmsConfig {
            risk_window_secs: -1.0,
            ..Default::default()
        };
        assert!(DmsModule::new(config, SessionContext::new("s")).is_err());
    }

    #[test]
    fn test_calibration_then_detection() {
        let mut module = DmsModule::new(DmsConfig::default(), SessionContext::new("s")).unwrap();
        let mut finished = None;
        let mut t = 0.0;
        while finished.is_none() && t < 20.0 {
            // Baseline EAR 0.3 / MAR 0.2, closed eyes in the blink probe
            let sample = if t >= 5.0 && t < 10.0 { face(0.1, 0.2) } else { face(0.3, 0.2) };
            if let FrameOutcome::CalibrationFinished(summary) =
                module.process_frame(t, std::slice::from_ref(&sample))
            {
                finished = Some(summary);
            }
            t += FRAME;
        }

        let summary = finished.expect("calibration should finish");
        assert!((summary.thresholds.ear_threshold - 0.24).abs() < 1e-9);
        assert!((summary.thresholds.mar_threshold - 0.36).abs() < 1e-9);
        assert!(summary.blink_samples > 0);
        assert!(!module.is_calibrating());
        assert_eq!(module.thresholds(), Some(summary.thresholds));
    }

    #[test]
    fn test_calibration_clock_starts_at_first_frame() {
        let mut module = DmsModule::new(DmsConfig::default(), SessionContext::new("s")).unwrap();
        assert!(module.is_calibrating());

        let mut finished = None;
        for i in 0..=80 {
            let t = 1000.0 + i as f64 * 0.25;
            if let FrameOutcome::CalibrationFinished(summary) =
                module.process_frame(t, &[face(0.3, 0.2)])
            {
                finished = Some((t, summary));
            }
        }

        let (t, summary) = finished.expect("calibration should finish");
        assert_eq!(t, 1015.0);
        assert!(summary.baseline_ear.count > 0);
        assert!((summary.thresholds.ear_threshold - 0.24).abs() < 1e-9);
    }

    #[test]
    fn test_calibration_ignores_multiple_faces() {
        let mut module = DmsModule::new(DmsConfig::default(), SessionContext::new("s")).unwrap();
        let faces = [face_at(0.0, 0.05, 0.9), face_at(600.0, 0.05, 0.9)];
        for i in 0..40 {
            module.process_frame(i as f64 * FRAME, &faces);
        }
        for t in [5.0, 10.0, 15.0] {
            module.process_frame(t, &[]);
        }
        assert_eq!(module.thresholds(), Some(ThresholdPair::default()));
    }

    #[test]
    fn test_sustained_closure_raises_risk() {
        let mut module = detecting(DmsConfig::default());
        let reports = run(&mut module, 0.0, 6.125, &[face(0.1, 0.2)]);

        let events: Vec<&Event> = reports.iter().flat_map(|r| r.events.iter()).collect();
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.event_type == EventType::EyeClosure));

        let last = reports.last().unwrap();
        assert!(last.risk());
        assert_eq!(last.recent_event_count, 3);
        assert!(last.events.is_empty());
        assert_eq!(last.alerts, vec![DmsAlert::Drowsiness]);
        let risky = reports.iter().find(|r| r.risk()).unwrap();
        assert!((risky.timestamp - 6.0).abs() < 1e-9);
        assert_eq!(risky.highest_severity_alert(), Some(DmsAlert::Drowsiness));
    }

    #[test]
    fn test_faces_do_not_share_state() {
        let mut module = detecting(DmsConfig::default());
        // Left face has closed eyes, right face is alert
        let faces = [face_at(0.0, 0.1, 0.2), face_at(600.0, 0.3, 0.2)];
        let reports = run(&mut module, 0.0, 6.0, &faces);

        let last = reports.last().unwrap();
        assert_eq!(last.faces.len(), 2);
        assert_eq!(last.at_risk, vec![last.faces[0].track]);
        assert_eq!(module.active_tracks(), 2);
    }

    #[test]
    fn test_absence_resets_by_default() {
        let mut module = detecting(DmsConfig::default());
        run(&mut module, 0.0, 1.875, &[face(0.1, 0.2)]);
        module.process_frame(2.0, &[]);
        // The run restarts at 2.125, so nothing by 4.0
        let reports = run(&mut module, 2.125, 4.0, &[face(0.1, 0.2)]);
        assert!(reports.iter().all(|r| r.events.is_empty()));
    }

    #[test]
    fn test_absence_hold_preserves_timer() {
        let config = DmsConfig {
            absence_policy: AbsencePolicy::Hold,
            ..Default::default()
        };
        let mut module = detecting(config);
        run(&mut module, 0.0, 1.875, &[face(0.1, 0.2)]);
        module.process_frame(2.0, &[]);
        let report = module.process_frame(2.125, &[face(0.1, 0.2)]);
        assert_eq!(report.detection().unwrap().events.len(), 1);
    }

    #[test]
    fn test_track_retired_after_timeout() {
        let mut module = detecting(DmsConfig::default());
        module.process_frame(0.0, &[face(0.3, 0.2)]);
        module.process_frame(2.0, &[]);
        assert_eq!(module.active_tracks(), 1);
        module.process_frame(3.5, &[]);
        assert_eq!(module.active_tracks(), 0);
    }

    #[test]
    fn test_yawn_events() {
        let mut module = detecting(DmsConfig::default());
        let reports = run(&mut module, 0.0, 2.0, &[face(0.3, 0.8)]);
        let events: Vec<&Event> = reports.iter().flat_map(|r| r.events.iter()).collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::Yawn);
        assert_eq!(events[0].session_id, "s1");
    }

    #[test]
    fn test_reset_state_clears_tracks() {
        let mut module = detecting(DmsConfig::default());
        module.process_frame(0.0, &[face(0.3, 0.2)]);
        module.reset_state();
        assert_eq!(module.active_tracks(), 0);
        assert!(module.thresholds().is_some());
    }
}
