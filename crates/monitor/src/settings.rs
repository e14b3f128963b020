//! Monitor settings

use alerting::AlertConfig;
use api::{load_settings, DashboardSettings, LoggingSettings};
use dms::{DmsConfig, ThresholdPair};
use serde::Deserialize;
use std::path::Path;
use storage::StorageSettings;

use crate::MonitorError;

/// Frame loop options
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoopSettings {
    /// Fixed thresholds; calibration is skipped when set
    pub thresholds: Option<ThresholdPair>,
    /// Serve the dashboard next to the frame loop
    pub serve_dashboard: bool,
}

/// Everything the monitor binary reads from `drowsiness.toml` and `DROWSY__*`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub logging: LoggingSettings,
    pub storage: StorageSettings,
    pub dashboard: DashboardSettings,
    pub dms: DmsConfig,
    pub alert: AlertConfig,
    pub monitor: LoopSettings,
}

impl MonitorSettings {
    pub fn load(file: Option<&Path>) -> Result<Self, MonitorError> {
        let settings: Self = load_settings(file)?;
        settings.dms.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dms::RearmPolicy;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_sections_override_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("drowsiness.toml");
        fs::write(
            &path,
            r#"
[dms]
eye_sustain_secs = 1.5
rearm_policy = "latched"

[dms.calibration]
phase_duration_secs = 3.0

[alert]
persistence_secs = 2.0

[monitor]
serve_dashboard = true

[monitor.thresholds]
ear_threshold = 0.22
mar_threshold = 0.55
"#,
        )
        .unwrap();

        let settings = MonitorSettings::load(Some(&path)).unwrap();
        assert_eq!(settings.dms.eye_sustain_secs, 1.5);
        assert_eq!(settings.dms.mouth_sustain_secs, 2.0);
        assert_eq!(settings.dms.rearm_policy, RearmPolicy::Latched);
        assert_eq!(settings.dms.calibration.phase_duration_secs, 3.0);
        assert_eq!(settings.dms.calibration.buffer_capacity, 30);
        assert_eq!(settings.alert.persistence_secs, 2.0);
        assert!(settings.monitor.serve_dashboard);

        let pair = settings.monitor.thresholds.unwrap();
        assert_eq!(pair.ear_threshold, 0.22);
        assert_eq!(pair.mar_threshold, 0.55);
    }

    #[test]
    fn test_invalid_dms_config_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("drowsiness.toml");
        fs::write(&path, "[dms]\nrisk_min_events = 0\n").unwrap();

        assert!(matches!(
            MonitorSettings::load(Some(&path)),
            Err(MonitorError::Dms(_))
        ));
    }

    #[test]
    fn test_defaults() {
        let settings = MonitorSettings::default();
        assert!(settings.monitor.thresholds.is_none());
        assert_eq!(settings.alert.persistence_secs, 1.0);
        assert_eq!(settings.dms.risk_min_events, 3);
    }
}
