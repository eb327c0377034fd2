//! Pose landmark model
//!
//! Defines the per-frame input contract of the pose provider: a set of named
//! body keypoints, each with normalized image coordinates, optional metric
//! world coordinates and a visibility score.

use crate::time::timebase::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named body keypoints tracked by the pose provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LandmarkName {
    Nose,
    LeftEye,
    RightEye,
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
    LeftFootIndex,
    RightFootIndex,
}

impl LandmarkName {
    /// Every landmark, in provider order
    pub const ALL: [LandmarkName; 27] = [
        LandmarkName::Nose,
        LandmarkName::LeftEye,
        LandmarkName::RightEye,
        LandmarkName::LeftEar,
        LandmarkName::RightEar,
        LandmarkName::MouthLeft,
        LandmarkName::MouthRight,
        LandmarkName::LeftShoulder,
        LandmarkName::RightShoulder,
        LandmarkName::LeftElbow,
        LandmarkName::RightElbow,
        LandmarkName::LeftWrist,
        LandmarkName::RightWrist,
        LandmarkName::LeftPinky,
        LandmarkName::RightPinky,
        LandmarkName::LeftIndex,
        LandmarkName::RightIndex,
        LandmarkName::LeftThumb,
        LandmarkName::RightThumb,
        LandmarkName::LeftHip,
        LandmarkName::RightHip,
        LandmarkName::LeftKnee,
        LandmarkName::RightKnee,
        LandmarkName::LeftAnkle,
        LandmarkName::RightAnkle,
        LandmarkName::LeftFootIndex,
        LandmarkName::RightFootIndex,
    ];

    /// Upper-case identifier, e.g. `LEFT_WRIST`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nose => "NOSE",
            Self::LeftEye => "LEFT_EYE",
            Self::RightEye => "RIGHT_EYE",
            Self::LeftEar => "LEFT_EAR",
            Self::RightEar => "RIGHT_EAR",
            Self::MouthLeft => "MOUTH_LEFT",
            Self::MouthRight => "MOUTH_RIGHT",
            Self::LeftShoulder => "LEFT_SHOULDER",
            Self::RightShoulder => "RIGHT_SHOULDER",
            Self::LeftElbow => "LEFT_ELBOW",
            Self::RightElbow => "RIGHT_ELBOW",
            Self::LeftWrist => "LEFT_WRIST",
            Self::RightWrist => "RIGHT_WRIST",
            Self::LeftPinky => "LEFT_PINKY",
            Self::RightPinky => "RIGHT_PINKY",
            Self::LeftIndex => "LEFT_INDEX",
            Self::RightIndex => "RIGHT_INDEX",
            Self::LeftThumb => "LEFT_THUMB",
            Self::RightThumb => "RIGHT_THUMB",
            Self::LeftHip => "LEFT_HIP",
            Self::RightHip => "RIGHT_HIP",
            Self::LeftKnee => "LEFT_KNEE",
            Self::RightKnee => "RIGHT_KNEE",
            Self::LeftAnkle => "LEFT_ANKLE",
            Self::RightAnkle => "RIGHT_ANKLE",
            Self::LeftFootIndex => "LEFT_FOOT_INDEX",
            Self::RightFootIndex => "RIGHT_FOOT_INDEX",
        }
    }
}

impl std::fmt::Display for LandmarkName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single tracked keypoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Normalized image coordinates (x right, y down, both 0..1)
    pub pose: [f64; 2],
    /// Metric world coordinates, if the provider produced them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world: Option<[f64; 3]>,
    /// Visibility/confidence score (0..1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

impl Landmark {
    pub fn new(pose: [f64; 2], world: [f64; 3], visibility: f64) -> Self {
        Self {
            pose,
            world: Some(world),
            visibility: Some(visibility),
        }
    }

    /// A landmark counts as visible when its score reaches the threshold.
    /// A missing score means the provider could not place it.
    pub fn is_visible(&self, threshold: f64) -> bool {
        self.visibility.is_some_and(|v| v >= threshold)
    }
}

/// Head orientation estimated by the provider, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceDirection {
    /// Pitch: positive when looking up
    pub x: f64,
    /// Yaw: positive when turned to the user's left
    pub y: f64,
}

/// One frame of pose-provider output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    /// Monotonic frame timestamp (milliseconds on disk)
    pub timestamp: Timestamp,
    /// Tracked landmarks; empty when no body was found
    #[serde(default)]
    pub landmarks: BTreeMap<LandmarkName, Landmark>,
    /// Head orientation, when the face mesh was solved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_direction: Option<FaceDirection>,
}

impl PoseFrame {
    /// Create an empty frame (no body detected)
    pub fn empty(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            landmarks: BTreeMap::new(),
            face_direction: None,
        }
    }

    /// Builder-style landmark insertion
    pub fn with_landmark(mut self, name: LandmarkName, landmark: Landmark) -> Self {
        self.landmarks.insert(name, landmark);
        self
    }

    /// Builder-style face direction
    pub fn with_face_direction(mut self, x: f64, y: f64) -> Self {
        self.face_direction = Some(FaceDirection { x, y });
        self
    }

    /// A frame is usable once the provider solved a body in world space.
    /// Individual landmarks without world coordinates only lose their 3-D features.
    pub fn has_pose(&self) -> bool {
        self.landmarks.values().any(|l| l.world.is_some())
    }

    /// Look up a landmark, gated by visibility
    pub fn visible(&self, name: LandmarkName, threshold: f64) -> Option<&Landmark> {
        self.landmarks.get(&name).filter(|l| l.is_visible(threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visible_landmark() -> Landmark {
        Landmark::new([0.5, 0.5], [0.0, 0.0, 0.0], 0.9)
    }

    #[test]
    fn test_visibility_threshold() {
        let lm = Landmark::new([0.1, 0.2], [0.0, 0.0, 0.0], 0.4);
        assert!(!lm.is_visible(0.5));
        assert!(lm.is_visible(0.4));

        let unknown = Landmark {
            pose: [0.1, 0.2],
            world: None,
            visibility: None,
        };
        assert!(!unknown.is_visible(0.0));
    }

    #[test]
    fn test_empty_frame_has_no_pose() {
        let frame = PoseFrame::empty(Timestamp::from_millis(0));
        assert!(!frame.has_pose());
    }

    #[test]
    fn test_frame_without_any_world_coords_has_no_pose() {
        let frame = PoseFrame::empty(Timestamp::from_millis(0)).with_landmark(
            LandmarkName::LeftWrist,
            Landmark {
                pose: [0.2, 0.3],
                world: None,
                visibility: Some(0.9),
            },
        );
        assert!(!frame.has_pose());
    }

    #[test]
    fn test_single_landmark_without_world_coords_keeps_pose() {
        let frame = PoseFrame::empty(Timestamp::from_millis(0))
            .with_landmark(LandmarkName::Nose, visible_landmark())
            .with_landmark(
                LandmarkName::LeftEar,
                Landmark {
                    pose: [0.2, 0.3],
                    world: None,
                    visibility: Some(0.1),
                },
            );
        assert!(frame.has_pose());
    }

    #[test]
    fn test_visible_lookup() {
        let frame = PoseFrame::empty(Timestamp::from_millis(0))
            .with_landmark(LandmarkName::Nose, visible_landmark())
            .with_landmark(
                LandmarkName::LeftWrist,
                Landmark::new([0.2, 0.3], [0.0, 0.0, 0.0], 0.1),
            );
        assert!(frame.has_pose());
        assert!(frame.visible(LandmarkName::Nose, 0.5).is_some());
        assert!(frame.visible(LandmarkName::LeftWrist, 0.5).is_none());
        assert!(frame.visible(LandmarkName::RightWrist, 0.5).is_none());
    }

    #[test]
    fn test_frame_json_shape() {
        let json = r#"{
            "timestamp": 33.0,
            "landmarks": {
                "NOSE": {"pose": [0.5, 0.2], "world": [0.0, -0.6, -0.3], "visibility": 0.99}
            },
            "face_direction": {"x": 2.0, "y": -10.5}
        }"#;
        let frame: PoseFrame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.timestamp, Timestamp::from_millis(33));
        assert_eq!(frame.landmarks.len(), 1);
        assert_eq!(frame.face_direction.map(|f| f.y), Some(-10.5));
    }

    #[test]
    fn test_landmark_names_are_unique() {
        let mut names: Vec<&str> = LandmarkName::ALL.iter().map(|n| n.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), LandmarkName::ALL.len());
    }
}
