//! Recorded landmark frames, one JSON object per line:
//! `{"timestamp": 1.25, "faces": [{"region": {...}, "landmarks": [[x, y], ...]}]}`

use dms::{FaceObservation, FaceRegion, LandmarkProvider};
use feature_engine::LandmarkSet;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use tracing::debug;

use crate::MonitorError;

/// One recorded frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    /// Capture time, monotonic seconds from the start of the recording
    pub timestamp: f64,
    #[serde(default)]
    pub faces: Vec<FaceObservation>,
}

/// Landmark provider that replays a JSON-lines recording
pub struct ReplayProvider<R> {
    lines: Lines<R>,
    line_no: usize,
}

impl ReplayProvider<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, MonitorError> {
        let file = File::open(path).map_err(|source| MonitorError::Input {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Replaying frames from {}", path.display());
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> ReplayProvider<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> LandmarkProvider for ReplayProvider<R> {
    type Frame = RecordedFrame;
    type Error = MonitorError;

    fn next_frame(&mut self) -> Result<Option<RecordedFrame>, MonitorError> {
        for line in self.lines.by_ref() {
            self.line_no += 1;
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let frame = serde_json::from_str(&line).map_err(|source| MonitorError::Replay {
                line: self.line_no,
                source,
            })?;
            return Ok(Some(frame));
        }
        Ok(None)
    }

    fn detect_faces(&mut self, frame: &RecordedFrame) -> Result<Vec<FaceRegion>, MonitorError> {
        Ok(frame.faces.iter().map(|face| face.region).collect())
    }

    fn landmarks(
        &mut self,
        frame: &RecordedFrame,
        region: &FaceRegion,
    ) -> Result<LandmarkSet, MonitorError> {
        frame
            .faces
            .iter()
            .find(|face| face.region == *region)
            .map(|face| face.landmarks.clone())
            .ok_or(MonitorError::UnknownRegion(*region))
    }

    fn frame_time(&self, frame: &RecordedFrame) -> Option<f64> {
        Some(frame.timestamp)
    }

    /// Recorded faces already carry their landmarks, so pair them by
    /// position rather than looking regions up again.
    fn observe(&mut self, frame: &RecordedFrame) -> Vec<FaceObservation> {
        frame.faces.clone()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use feature_engine::{LANDMARK_COUNT, LEFT_EYE, MOUTH, RIGHT_EYE};
    use serde_json::json;

    /// 68 points whose mean EAR and MAR equal the given values
    pub fn landmark_points(ear: f64, mar: f64) -> Vec<[f64; 2]> {
        let mut points = vec![[0.0, 0.0]; LANDMARK_COUNT];
        let eye_gap = ear * 30.0;
        for (eye, x0) in [(LEFT_EYE, 100.0), (RIGHT_EYE, 200.0)] {
            points[eye[0]] = [x0, 100.0];
            points[eye[1]] = [x0 + 10.0, 100.0 - eye_gap / 2.0];
            points[eye[2]] = [x0 + 20.0, 100.0 - eye_gap / 2.0];
            points[eye[3]] = [x0 + 30.0, 100.0];
            points[eye[4]] = [x0 + 20.0, 100.0 + eye_gap / 2.0];
            points[eye[5]] = [x0 + 10.0, 100.0 + eye_gap / 2.0];
        }
        let mouth_gap = mar * 40.0;
        points[MOUTH[0]] = [130.0, 200.0];
        points[MOUTH[6]] = [170.0, 200.0];
        for (top, bottom, x) in [(2, 10, 143.0), (4, 8, 157.0)] {
            points[MOUTH[top]] = [x, 200.0 - mouth_gap / 2.0];
            points[MOUTH[bottom]] = [x, 200.0 + mouth_gap / 2.0];
        }
        points
    }

    /// One JSON line with a single face
    pub fn frame_line(timestamp: f64, ear: f64, mar: f64) -> String {
        json!({
            "timestamp": timestamp,
            "faces": [{
                "region": { "x": 50.0, "y": 50.0, "width": 200.0, "height": 220.0 },
                "landmarks": landmark_points(ear, mar),
            }],
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{frame_line, landmark_points};
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_replays_frames_and_skips_blank_lines() {
        let input = format!(
            "{}\n\n{}\n{{\"timestamp\": 0.5}}\n",
            frame_line(0.0, 0.3, 0.2),
            frame_line(0.25, 0.1, 0.2)
        );
        let mut provider = ReplayProvider::from_reader(Cursor::new(input));

        let first = provider.next_frame().unwrap().unwrap();
        assert_eq!(provider.frame_time(&first), Some(0.0));
        let faces = provider.observe(&first);
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].region.width, 200.0);

        let second = provider.next_frame().unwrap().unwrap();
        assert_eq!(second.timestamp, 0.25);

        let empty = provider.next_frame().unwrap().unwrap();
        assert!(provider.observe(&empty).is_empty());

        assert!(provider.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_bad_line_reports_line_number() {
        let input = format!("{}\nnot json\n", frame_line(0.0, 0.3, 0.2));
        let mut provider = ReplayProvider::from_reader(Cursor::new(input));

        provider.next_frame().unwrap();
        match provider.next_frame() {
            Err(MonitorError::Replay { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected replay error, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_landmark_count_is_rejected() {
        let input = r#"{"timestamp": 0.0, "faces": [{"region": {"x": 0, "y": 0, "width": 1, "height": 1}, "landmarks": [[0, 0]]}]}"#;
        let mut provider = ReplayProvider::from_reader(Cursor::new(input));
        assert!(matches!(provider.next_frame(), Err(MonitorError::Replay { .. })));
    }

    #[test]
    fn test_faces_sharing_a_region_keep_their_landmarks() {
        let region = FaceRegion::new(50.0, 50.0, 200.0, 220.0);
        let open = LandmarkSet::from_points(landmark_points(0.3, 0.2)).unwrap();
        let closed = LandmarkSet::from_points(landmark_points(0.1, 0.2)).unwrap();
        let frame = RecordedFrame {
            timestamp: 0.0,
            faces: vec![
                FaceObservation::new(region, open.clone()),
                FaceObservation::new(region, closed.clone()),
            ],
        };
        let mut provider = ReplayProvider::from_reader(Cursor::new(String::new()));

        let faces = provider.observe(&frame);
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0].landmarks, open);
        assert_eq!(faces[1].landmarks, closed);
    }

    #[test]
    fn test_unknown_region() {
        let mut provider = ReplayProvider::from_reader(Cursor::new(String::new()));
        let frame = RecordedFrame {
            timestamp: 0.0,
            faces: Vec::new(),
        };
        let region = FaceRegion::new(0.0, 0.0, 10.0, 10.0);
        assert!(matches!(
            provider.landmarks(&frame, &region),
            Err(MonitorError::UnknownRegion(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = ReplayProvider::open(Path::new("/nonexistent/frames.jsonl"))
            .err()
            .unwrap();
        assert!(matches!(err, MonitorError::Input { .. }));
    }
}
