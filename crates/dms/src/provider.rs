//! Landmark provider seam
//!
//! Face detection and landmark fitting happen outside this crate. A
//! provider hands the pipeline frames, face regions and 68-point landmark
//! sets; how it computes them is its own business.

use feature_engine::{LandmarkSet, Point2};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::tracking::FaceRegion;
use crate::DmsError;

/// One detected face with its landmarks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceObservation {
    pub region: FaceRegion,
    pub landmarks: LandmarkSet,
}

impl FaceObservation {
    pub fn new(region: FaceRegion, landmarks: LandmarkSet) -> Self {
        Self { region, landmarks }
    }

    /// Build from raw points, validating the landmark count and coordinates
    pub fn from_points<I, P>(region: FaceRegion, points: I) -> Result<Self, DmsError>
    where
        I: IntoIterator<Item = P>,
        P: Into<Point2>,
    {
        Ok(Self::new(region, LandmarkSet::from_points(points)?))
    }
}

/// External face/landmark source
pub trait LandmarkProvider {
    type Frame;
    type Error: std::error::Error;

    /// Next frame, or `None` when the source is exhausted
    fn next_frame(&mut self) -> Result<Option<Self::Frame>, Self::Error>;

    /// Face regions in a frame (zero or more)
    fn detect_faces(&mut self, frame: &Self::Frame) -> Result<Vec<FaceRegion>, Self::Error>;

    /// Landmarks for one region of a frame
    fn landmarks(
        &mut self,
        frame: &Self::Frame,
        region: &FaceRegion,
    ) -> Result<LandmarkSet, Self::Error>;

    /// Capture time recorded with the frame (monotonic seconds), if any
    fn frame_time(&self, _frame: &Self::Frame) -> Option<f64> {
        None
    }

    /// Detect and fit every face in a frame. Failures are logged and the
    /// affected face (or the whole frame, for detection errors) is skipped.
    fn observe(&mut self, frame: &Self::Frame) -> Vec<FaceObservation> {
        let regions = match self.detect_faces(frame) {
            Ok(regions) => regions,
            Err(e) => {
                warn!("Face detection failed, treating frame as empty: {}", e);
                return Vec::new();
            }
        };

        regions
            .into_iter()
            .filter_map(|region| match self.landmarks(frame, &region) {
                Ok(landmarks) => Some(FaceObservation::new(region, landmarks)),
                Err(e) => {
                    warn!("Landmark extraction failed for {:?}: {}", region, e);
                    None
                }
            })
            .collect()
    }
}
