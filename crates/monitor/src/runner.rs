//! Frame loop

use alerting::{AlertController, AlertSink, LogAlertSink};
use dms::{
    CalibrationPhase, DetectionReport, DmsAlert, DmsModule, FaceObservation, FrameOutcome,
    LandmarkProvider, SessionContext,
};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use storage::EventLog;
use tracing::{debug, info, warn};

use crate::{MonitorError, MonitorSettings};

/// Shared flag that ends the frame loop
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    pub frames: usize,
    pub events: usize,
    /// Frames in which at least one face was at risk
    pub risk_frames: usize,
    /// Events that could not be written to the log
    pub log_failures: usize,
}

/// Drives the DMS pipeline, the alert side-channel and the event log
pub struct Monitor<S: AlertSink = LogAlertSink> {
    dms: DmsModule,
    alerts: AlertController<S>,
    event_log: Arc<dyn EventLog>,
    stop: StopFlag,
    started: Instant,
    last_phase: Option<CalibrationPhase>,
    stats: RunStats,
}

impl Monitor<LogAlertSink> {
    /// Build from settings. Calibration starts with the first frame unless
    /// fixed thresholds are configured.
    pub fn from_settings(
        settings: &MonitorSettings,
        session: SessionContext,
        event_log: Arc<dyn EventLog>,
        stop: StopFlag,
    ) -> Result<Self, MonitorError> {
        let dms = match settings.monitor.thresholds {
            Some(pair) => DmsModule::with_thresholds(settings.dms.clone(), session, pair)?,
            None => DmsModule::new(settings.dms.clone(), session)?,
        };
        let alerts = AlertController::new(settings.alert.clone(), LogAlertSink::new());
        Ok(Self::new(dms, alerts, event_log, stop))
    }
}

impl<S: AlertSink> Monitor<S> {
    pub fn new(
        dms: DmsModule,
        alerts: AlertController<S>,
        event_log: Arc<dyn EventLog>,
        stop: StopFlag,
    ) -> Self {
        info!("Monitoring session {}", dms.session());
        Self {
            dms,
            alerts,
            event_log,
            stop,
            started: Instant::now(),
            last_phase: None,
            stats: RunStats::default(),
        }
    }

    /// Run frames from `provider` until it is exhausted or the stop flag is set
    pub fn run<P: LandmarkProvider>(&mut self, provider: &mut P) -> Result<RunStats, MonitorError> {
        while !self.stop.is_stopped() {
            let frame = match provider.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => return Err(MonitorError::Provider(e.to_string())),
            };

            // One clock reading per frame
            let now = provider
                .frame_time(&frame)
                .unwrap_or_else(|| self.started.elapsed().as_secs_f64());
            let faces = provider.observe(&frame);
            self.step(now, &faces);
        }

        info!(
            "Monitor stopped after {} frames ({} events, {} at-risk frames)",
            self.stats.frames, self.stats.events, self.stats.risk_frames
        );
        Ok(self.stats.clone())
    }

    /// Process one frame observed at `now`
    pub fn step(&mut self, now: f64, faces: &[FaceObservation]) -> FrameOutcome {
        self.stats.frames += 1;
        let outcome = self.dms.process_frame(now, faces);

        match &outcome {
            FrameOutcome::Calibrating {
                phase,
                instructions,
                progress,
            } => {
                if self.last_phase != Some(*phase) {
                    info!("Calibration phase {}/{}: {}", progress.0, progress.1, instructions);
                    self.last_phase = Some(*phase);
                }
            }
            FrameOutcome::CalibrationFinished(summary) => {
                info!(
                    "{} EAR threshold {:.2}, MAR threshold {:.2}",
                    CalibrationPhase::Done.instructions(),
                    summary.thresholds.ear_threshold,
                    summary.thresholds.mar_threshold
                );
            }
            FrameOutcome::Detection(report) => self.handle_detection(report, now),
        }

        outcome
    }

    fn handle_detection(&mut self, report: &DetectionReport, now: f64) {
        for event in &report.events {
            self.stats.events += 1;
            if let Err(e) = self.event_log.append(event) {
                self.stats.log_failures += 1;
                warn!("Failed to log {} event: {}", event.event_type, e);
            }
            self.alerts
                .trigger(DmsAlert::from(event.event_type).reason(), now);
        }

        if report.risk() {
            self.stats.risk_frames += 1;
            debug!(
                "Risk at t={:.3}: {} recent events",
                now, report.recent_event_count
            );
            self.alerts.trigger(DmsAlert::Drowsiness.reason(), now);
        } else if !self.alerts.is_active(now) {
            self.alerts.stop();
        }
    }

    pub fn dms(&self) -> &DmsModule {
        &self.dms
    }

    pub fn alerts(&self) -> &AlertController<S> {
        &self.alerts
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }
}
