//! Feature Engineering Engine
//!
//! Turns 68-point facial landmarks into the scalar signals used for
//! drowsiness detection:
//! - Eye Aspect Ratio (EAR): low values mean closed eyes
//! - Mouth Aspect Ratio (MAR): high values mean an open mouth
//!
//! Also provides the percentile and summary statistics used by calibration.

mod features;
mod landmarks;
mod statistics;

pub use features::{ear, mar, FaceFeatures, FeatureExtractor, MIN_SPAN};
pub use landmarks::{LandmarkSet, Point2, LANDMARK_COUNT, LEFT_EYE, MOUTH, RIGHT_EYE};
pub use statistics::{percentile, StatisticalFeatures};

use thiserror::Error;

/// Feature computation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    #[error("Degenerate geometry: horizontal span {span} is too small")]
    DegenerateGeometry { span: f64 },

    #[error("Invalid landmark set: {0}")]
    InvalidLandmarks(String),
}
