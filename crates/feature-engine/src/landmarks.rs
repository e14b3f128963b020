//! Facial landmark types and the 68-point index layout

use crate::FeatureError;
use serde::{Deserialize, Serialize};

/// Number of points in a facial landmark set
pub const LANDMARK_COUNT: usize = 68;

/// Left eye contour, outer corner first
pub const LEFT_EYE: [usize; 6] = [36, 37, 38, 39, 40, 41];

/// Right eye contour, outer corner first
pub const RIGHT_EYE: [usize; 6] = [42, 43, 44, 45, 46, 47];

/// Outer mouth contour, left corner first
pub const MOUTH: [usize; 12] = [48, 49, 50, 51, 52, 53, 54, 55, 56, 57, 58, 59];

/// 2D image-space point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for Point2 {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

/// Validated set of 68 facial landmarks for one face in one frame
///
/// Serialized as a list of `[x, y]` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: [Point2; LANDMARK_COUNT],
}

impl LandmarkSet {
    /// Build from a fixed array, rejecting non-finite coordinates
    pub fn new(points: [Point2; LANDMARK_COUNT]) -> Result<Self, FeatureError> {
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(FeatureError::InvalidLandmarks(format!(
                "point {} has a non-finite coordinate",
                index
            )));
        }
        Ok(Self { points })
    }

    /// Build from any sequence of points; the sequence must hold exactly 68
    pub fn from_points<I, P>(points: I) -> Result<Self, FeatureError>
    where
        I: IntoIterator<Item = P>,
        P: Into<Point2>,
    {
        let collected: Vec<Point2> = points.into_iter().map(Into::into).collect();
        let len = collected.len();
        let array: [Point2; LANDMARK_COUNT] = collected.try_into().map_err(|_| {
            FeatureError::InvalidLandmarks(format!(
                "expected {} points, got {}",
                LANDMARK_COUNT, len
            ))
        })?;
        Self::new(array)
    }

    /// Point at a landmark index (panics only on index >= 68, which the
    /// named constants never produce)
    pub fn point(&self, index: usize) -> Point2 {
        self.points[index]
    }

    /// Gather the points named by an index subset
    pub fn select<const N: usize>(&self, indices: &[usize; N]) -> [Point2; N] {
        indices.map(|i| self.points[i])
    }

    pub fn points(&self) -> &[Point2; LANDMARK_COUNT] {
        &self.points
    }
}

impl Serialize for LandmarkSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.points.iter().map(|p| [p.x, p.y]))
    }
}

impl<'de> Deserialize<'de> for LandmarkSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = Vec::<[f64; 2]>::deserialize(deserializer)?;
        LandmarkSet::from_points(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_wrong_length() {
        let err = LandmarkSet::from_points(vec![(0.0, 0.0); 67]).unwrap_err();
        assert!(matches!(err, FeatureError::InvalidLandmarks(_)));
    }

    #[test]
    fn test_rejects_nan() {
        let mut points = [Point2::default(); LANDMARK_COUNT];
        points[40] = Point2::new(f64::NAN, 1.0);
        assert!(LandmarkSet::new(points).is_err());
    }

    #[test]
    fn test_index_layout() {
        assert_eq!(LEFT_EYE[5] + 1, RIGHT_EYE[0]);
        assert_eq!(RIGHT_EYE[5] + 1, MOUTH[0]);
        assert!(MOUTH.iter().all(|&i| i < LANDMARK_COUNT));
    }

    #[test]
    fn test_deserialize_from_pairs() {
        let pairs: Vec<[f64; 2]> = (0..68).map(|i| [i as f64, 2.0 * i as f64]).collect();
        let json = serde_json::to_string(&pairs).unwrap();
        let set: LandmarkSet = serde_json::from_str(&json).unwrap();
        assert_eq!(set.point(10), Point2::new(10.0, 20.0));
    }
}
