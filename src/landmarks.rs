use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const NUM_LANDMARKS: usize = 33;

/// Named body points in the 33-point BlazePose topology, in model output order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoseLandmark {
    Nose,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl PoseLandmark {
    pub const ALL: [PoseLandmark; NUM_LANDMARKS] = [
        PoseLandmark::Nose,
        PoseLandmark::LeftEyeInner,
        PoseLandmark::LeftEye,
        PoseLandmark::LeftEyeOuter,
        PoseLandmark::RightEyeInner,
        PoseLandmark::RightEye,
        PoseLandmark::RightEyeOuter,
        PoseLandmark::LeftEar,
        PoseLandmark::RightEar,
        PoseLandmark::MouthLeft,
        PoseLandmark::MouthRight,
        PoseLandmark::LeftShoulder,
        PoseLandmark::RightShoulder,
        PoseLandmark::LeftElbow,
        PoseLandmark::RightElbow,
        PoseLandmark::LeftWrist,
        PoseLandmark::RightWrist,
        PoseLandmark::LeftPinky,
        PoseLandmark::RightPinky,
        PoseLandmark::LeftIndex,
        PoseLandmark::RightIndex,
        PoseLandmark::LeftThumb,
        PoseLandmark::RightThumb,
        PoseLandmark::LeftHip,
        PoseLandmark::RightHip,
        PoseLandmark::LeftKnee,
        PoseLandmark::RightKnee,
        PoseLandmark::LeftAnkle,
        PoseLandmark::RightAnkle,
        PoseLandmark::LeftHeel,
        PoseLandmark::RightHeel,
        PoseLandmark::LeftFootIndex,
        PoseLandmark::RightFootIndex,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            PoseLandmark::Nose => "nose",
            PoseLandmark::LeftEyeInner => "left_eye_inner",
            PoseLandmark::LeftEye => "left_eye",
            PoseLandmark::LeftEyeOuter => "left_eye_outer",
            PoseLandmark::RightEyeInner => "right_eye_inner",
            PoseLandmark::RightEye => "right_eye",
            PoseLandmark::RightEyeOuter => "right_eye_outer",
            PoseLandmark::LeftEar => "left_ear",
            PoseLandmark::RightEar => "right_ear",
            PoseLandmark::MouthLeft => "mouth_left",
            PoseLandmark::MouthRight => "mouth_right",
            PoseLandmark::LeftShoulder => "left_shoulder",
            PoseLandmark::RightShoulder => "right_shoulder",
            PoseLandmark::LeftElbow => "left_elbow",
            PoseLandmark::RightElbow => "right_elbow",
            PoseLandmark::LeftWrist => "left_wrist",
            PoseLandmark::RightWrist => "right_wrist",
            PoseLandmark::LeftPinky => "left_pinky",
            PoseLandmark::RightPinky => "right_pinky",
            PoseLandmark::LeftIndex => "left_index",
            PoseLandmark::RightIndex => "right_index",
            PoseLandmark::LeftThumb => "left_thumb",
            PoseLandmark::RightThumb => "right_thumb",
            PoseLandmark::LeftHip => "left_hip",
            PoseLandmark::RightHip => "right_hip",
            PoseLandmark::LeftKnee => "left_knee",
            PoseLandmark::RightKnee => "right_knee",
            PoseLandmark::LeftAnkle => "left_ankle",
            PoseLandmark::RightAnkle => "right_ankle",
            PoseLandmark::LeftHeel => "left_heel",
            PoseLandmark::RightHeel => "right_heel",
            PoseLandmark::LeftFootIndex => "left_foot_index",
            PoseLandmark::RightFootIndex => "right_foot_index",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|lm| lm.name() == name)
    }
}

/// Skeleton edges drawn by the overlay renderer.
pub const POSE_CONNECTIONS: &[(PoseLandmark, PoseLandmark)] = &[
    (PoseLandmark::LeftShoulder, PoseLandmark::RightShoulder),
    (PoseLandmark::LeftShoulder, PoseLandmark::LeftElbow),
    (PoseLandmark::LeftElbow, PoseLandmark::LeftWrist),
    (PoseLandmark::RightShoulder, PoseLandmark::RightElbow),
    (PoseLandmark::RightElbow, PoseLandmark::RightWrist),
    (PoseLandmark::LeftShoulder, PoseLandmark::LeftHip),
    (PoseLandmark::RightShoulder, PoseLandmark::RightHip),
    (PoseLandmark::LeftHip, PoseLandmark::RightHip),
    (PoseLandmark::LeftHip, PoseLandmark::LeftKnee),
    (PoseLandmark::LeftKnee, PoseLandmark::LeftAnkle),
    (PoseLandmark::LeftAnkle, PoseLandmark::LeftHeel),
    (PoseLandmark::LeftHeel, PoseLandmark::LeftFootIndex),
    (PoseLandmark::LeftAnkle, PoseLandmark::LeftFootIndex),
    (PoseLandmark::RightHip, PoseLandmark::RightKnee),
    (PoseLandmark::RightKnee, PoseLandmark::RightAnkle),
    (PoseLandmark::RightAnkle, PoseLandmark::RightHeel),
    (PoseLandmark::RightHeel, PoseLandmark::RightFootIndex),
    (PoseLandmark::RightAnkle, PoseLandmark::RightFootIndex),
    (PoseLandmark::Nose, PoseLandmark::LeftEyeInner),
    (PoseLandmark::LeftEyeInner, PoseLandmark::LeftEye),
    (PoseLandmark::LeftEye, PoseLandmark::LeftEyeOuter),
    (PoseLandmark::LeftEyeOuter, PoseLandmark::LeftEar),
    (PoseLandmark::Nose, PoseLandmark::RightEyeInner),
    (PoseLandmark::RightEyeInner, PoseLandmark::RightEye),
    (PoseLandmark::RightEye, PoseLandmark::RightEyeOuter),
    (PoseLandmark::RightEyeOuter, PoseLandmark::RightEar),
    (PoseLandmark::MouthLeft, PoseLandmark::MouthRight),
];

/// One estimated body point in normalized frame coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
    #[serde(default = "default_visibility")]
    pub visibility: f32,
}

fn default_visibility() -> f32 {
    1.0
}

impl Landmark {
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility,
        }
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.visibility.is_finite()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LandmarkError {
    #[error("landmark {} is missing", .0.name())]
    Missing(PoseLandmark),
    #[error("landmark {} has non-finite coordinates", .0.name())]
    NonFinite(PoseLandmark),
}

/// Landmarks produced for a single frame. Points the estimator did not
/// report are absent rather than zeroed.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkSet {
    points: [Option<Landmark>; NUM_LANDMARKS],
}

impl Default for LandmarkSet {
    fn default() -> Self {
        Self {
            points: [None; NUM_LANDMARKS],
        }
    }
}

impl LandmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, which: PoseLandmark, landmark: Landmark) -> Self {
        self.insert(which, landmark);
        self
    }

    pub fn insert(&mut self, which: PoseLandmark, landmark: Landmark) {
        self.points[which.index()] = Some(landmark);
    }

    pub fn get(&self, which: PoseLandmark) -> Option<&Landmark> {
        self.points[which.index()].as_ref()
    }

    /// Looks up a point that downstream arithmetic depends on.
    pub fn require(&self, which: PoseLandmark) -> Result<&Landmark, LandmarkError> {
        let landmark = self.get(which).ok_or(LandmarkError::Missing(which))?;
        if !landmark.is_finite() {
            return Err(LandmarkError::NonFinite(which));
        }
        Ok(landmark)
    }

    pub fn len(&self) -> usize {
        self.points.iter().filter(|p| p.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (PoseLandmark, &Landmark)> {
        PoseLandmark::ALL
            .iter()
            .zip(self.points.iter())
            .filter_map(|(which, point)| point.as_ref().map(|lm| (*which, lm)))
    }

    /// Builds a set from name-keyed points, returning the names that did not
    /// match any known body point.
    pub fn from_named(named: HashMap<String, Landmark>) -> (Self, Vec<String>) {
        let mut set = Self::new();
        let mut unknown = Vec::new();
        for (name, landmark) in named {
            match PoseLandmark::from_name(&name) {
                Some(which) => set.insert(which, landmark),
                None => unknown.push(name),
            }
        }
        unknown.sort();
        (set, unknown)
    }

    /// Pixel positions of every point, for drawing.
    pub fn project(&self, width: u32, height: u32) -> Vec<(PoseLandmark, (f32, f32), f32)> {
        let max_x = width.saturating_sub(1) as f32;
        let max_y = height.saturating_sub(1) as f32;
        self.iter()
            .filter(|(_, lm)| lm.is_finite())
            .map(|(which, lm)| {
                (
                    which,
                    (
                        (lm.x * width as f32).clamp(0.0, max_x),
                        (lm.y * height as f32).clamp(0.0, max_y),
                    ),
                    lm.visibility,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_lookup() {
        for which in PoseLandmark::ALL {
            assert_eq!(PoseLandmark::from_name(which.name()), Some(which));
        }
        assert_eq!(PoseLandmark::LeftHip.index(), 23);
        assert_eq!(PoseLandmark::RightKnee.index(), 26);
        assert_eq!(PoseLandmark::from_name("tail"), None);
    }

    #[test]
    fn require_reports_missing_and_non_finite() {
        let set = LandmarkSet::new()
            .with(PoseLandmark::LeftHip, Landmark::new(0.5, 0.5, 0.9))
            .with(PoseLandmark::RightHip, Landmark::new(f32::NAN, 0.5, 0.9));

        assert!(set.require(PoseLandmark::LeftHip).is_ok());
        assert_eq!(
            set.require(PoseLandmark::RightHip),
            Err(LandmarkError::NonFinite(PoseLandmark::RightHip))
        );
        assert_eq!(
            set.require(PoseLandmark::LeftKnee),
            Err(LandmarkError::Missing(PoseLandmark::LeftKnee))
        );
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn from_named_collects_unknown_names() {
        let mut named = HashMap::new();
        named.insert("left_knee".to_string(), Landmark::new(0.1, 0.2, 0.3));
        named.insert("tail".to_string(), Landmark::new(0.0, 0.0, 1.0));

        let (set, unknown) = LandmarkSet::from_named(named);
        assert_eq!(unknown, vec!["tail".to_string()]);
        assert_eq!(
            set.get(PoseLandmark::LeftKnee).map(|lm| lm.position()),
            Some((0.1, 0.2))
        );
    }

    #[test]
    fn projection_clamps_to_frame() {
        let set = LandmarkSet::new()
            .with(PoseLandmark::Nose, Landmark::new(0.5, 0.25, 1.0))
            .with(PoseLandmark::LeftAnkle, Landmark::new(1.2, -0.1, 1.0));
        let projected = set.project(200, 100);
        assert_eq!(projected[0].1, (100.0, 25.0));
        assert_eq!(projected[1].1, (199.0, 0.0));
    }
}
