//! Eye and mouth aspect ratios

use crate::landmarks::{LandmarkSet, Point2, LEFT_EYE, MOUTH, RIGHT_EYE};
use crate::FeatureError;
use serde::{Deserialize, Serialize};

/// Minimum horizontal span accepted as a ratio denominator (pixels)
pub const MIN_SPAN: f64 = 1e-6;

/// Eye Aspect Ratio over six eye points `p0..p5`:
/// `(|p1 p5| + |p2 p4|) / (2 |p0 p3|)`
pub fn ear(landmarks: &LandmarkSet, eye_indices: &[usize; 6]) -> Result<f64, FeatureError> {
    let p = landmarks.select(eye_indices);
    aspect_ratio(&p[0], &p[3], [(&p[1], &p[5]), (&p[2], &p[4])])
}

/// Mouth Aspect Ratio over twelve mouth points `p0..p11`:
/// `(|p2 p10| + |p4 p8|) / (2 |p0 p6|)`
pub fn mar(landmarks: &LandmarkSet, mouth_indices: &[usize; 12]) -> Result<f64, FeatureError> {
    let p = landmarks.select(mouth_indices);
    aspect_ratio(&p[0], &p[6], [(&p[2], &p[10]), (&p[4], &p[8])])
}

fn aspect_ratio(
    left: &Point2,
    right: &Point2,
    verticals: [(&Point2, &Point2); 2],
) -> Result<f64, FeatureError> {
    let span = left.distance(right);
    if span < MIN_SPAN {
        return Err(FeatureError::DegenerateGeometry { span });
    }
    let vertical: f64 = verticals.iter().map(|(a, b)| a.distance(b)).sum();
    Ok(vertical / (2.0 * span))
}

/// Per-frame facial signals; `None` where geometry was unusable
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceFeatures {
    /// Mean EAR of both eyes
    pub ear: Option<f64>,
    /// Mouth aspect ratio
    pub mar: Option<f64>,
}

/// Computes the eye and mouth signals for a landmark set
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract both signals; a degenerate eye on either side drops the eye
    /// signal only, a degenerate mouth drops the mouth signal only
    pub fn extract(&self, landmarks: &LandmarkSet) -> FaceFeatures {
        let ear = match (ear(landmarks, &LEFT_EYE), ear(landmarks, &RIGHT_EYE)) {
            (Ok(left), Ok(right)) => Some((left + right) / 2.0),
            (Err(e), _) | (_, Err(e)) => {
                tracing::trace!("Eye signal skipped: {}", e);
                None
            }
        };

        let mar = mar(landmarks, &MOUTH)
            .map_err(|e| tracing::trace!("Mouth signal skipped: {}", e))
            .ok();

        FaceFeatures { ear, mar }
    }
}
