//! Frame-to-frame face identity

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Face bounding box in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FaceRegion {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    fn center_distance(&self, other: &FaceRegion) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        (ax - bx).hypot(ay - by)
    }
}

/// Stable identifier of a face across frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "face#{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct Track {
    region: FaceRegion,
    last_seen: f64,
}

/// Greedy nearest-centre tracker
#[derive(Debug, Clone)]
pub struct FaceTracker {
    tracks: BTreeMap<TrackId, Track>,
    next_id: u64,
    match_ratio: f64,
}

impl FaceTracker {
    /// `match_ratio` scales the larger bbox side into the match radius
    pub fn new(match_ratio: f64) -> Self {
        Self {
            tracks: BTreeMap::new(),
            next_id: 0,
            match_ratio,
        }
    }

    /// Assign a track to every region, in order. Each live track is claimed
    /// by at most one region per frame; unmatched regions open new tracks.
    pub fn assign(&mut self, regions: &[FaceRegion], now: f64) -> Vec<TrackId> {
        let mut claimed: Vec<TrackId> = Vec::with_capacity(regions.len());

        for region in regions {
            let radius = self.match_ratio * region.width.max(region.height);
            let best = self
                .tracks
                .iter()
                .filter(|(id, _)| !claimed.contains(*id))
                .map(|(id, track)| (*id, track.region.center_distance(region)))
                .filter(|(_, distance)| *distance <= radius)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(id, _)| id);

            let id = match best {
                Some(id) => id,
                None => {
                    let id = TrackId(self.next_id);
                    self.next_id += 1;
                    debug!("New face track {}", id);
                    id
                }
            };

            self.tracks.insert(
                id,
                Track {
                    region: *region,
                    last_seen: now,
                },
            );
            claimed.push(id);
        }

        claimed
    }

    /// Remove tracks unseen for longer than `timeout`; returns their ids
    pub fn retire(&mut self, now: f64, timeout: f64) -> Vec<TrackId> {
        let expired: Vec<TrackId> = self
            .tracks
            .iter()
            .filter(|(_, track)| now - track.last_seen > timeout)
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            self.tracks.remove(id);
            debug!("Retired face track {}", id);
        }
        expired
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(x: f64) -> FaceRegion {
        FaceRegion::new(x, 100.0, 100.0, 120.0)
    }

    #[test]
    fn test_same_face_keeps_id() {
        let mut tracker = FaceTracker::new(0.5);
        let first = tracker.assign(&[region(0.0)], 0.0);
        let second = tracker.assign(&[region(20.0)], 0.1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_distant_face_gets_new_id() {
        let mut tracker = FaceTracker::new(0.5);
        let first = tracker.assign(&[region(0.0)], 0.0);
        let second = tracker.assign(&[region(300.0)], 0.1);
        assert_ne!(first, second);
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_two_faces_never_share_a_track() {
        let mut tracker = FaceTracker::new(0.5);
        tracker.assign(&[region(0.0)], 0.0);
        // Both regions are within radius of the single existing track
        let ids = tracker.assign(&[region(10.0), region(30.0)], 0.1);
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_retire_after_timeout() {
        let mut tracker = FaceTracker::new(0.5);
        let ids = tracker.assign(&[region(0.0)], 0.0);
        assert!(tracker.retire(3.0, 3.0).is_empty());
        assert_eq!(tracker.retire(3.1, 3.0), ids);
        assert!(tracker.is_empty());
    }
}
