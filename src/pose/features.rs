//! Feature extraction
//!
//! Derives the named scalars gesture predicates read: joint angles, slopes,
//! planar angles, head orientation and raw landmark positions. A feature whose
//! landmarks are not visible is simply absent from the [`FeatureState`].

use super::landmarks::{LandmarkName, PoseFrame};
use crate::time::timebase::Timestamp;
use crate::FrameError;
use std::collections::BTreeMap;

/// Three-point joint angles, measured in world space at the middle landmark
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JointAngle {
    LeftShoulder,
    RightShoulder,
    LeftElbowShoulders,
    RightElbowShoulders,
    LeftElbow,
    RightElbow,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftHipKnee,
    RightHipKnee,
}

impl JointAngle {
    pub const ALL: [JointAngle; 12] = [
        JointAngle::LeftShoulder,
        JointAngle::RightShoulder,
        JointAngle::LeftElbowShoulders,
        JointAngle::RightElbowShoulders,
        JointAngle::LeftElbow,
        JointAngle::RightElbow,
        JointAngle::LeftHip,
        JointAngle::RightHip,
        JointAngle::LeftKnee,
        JointAngle::RightKnee,
        JointAngle::LeftHipKnee,
        JointAngle::RightHipKnee,
    ];

    /// (outer, vertex, outer)
    pub fn landmarks(&self) -> (LandmarkName, LandmarkName, LandmarkName) {
        use LandmarkName::*;
        match self {
            Self::LeftShoulder => (LeftElbow, LeftShoulder, LeftHip),
            Self::RightShoulder => (RightElbow, RightShoulder, RightHip),
            Self::LeftElbowShoulders => (LeftElbow, LeftShoulder, RightShoulder),
            Self::RightElbowShoulders => (RightElbow, RightShoulder, LeftShoulder),
            Self::LeftElbow => (LeftShoulder, LeftElbow, LeftWrist),
            Self::RightElbow => (RightShoulder, RightElbow, RightWrist),
            Self::LeftHip => (LeftShoulder, LeftHip, LeftKnee),
            Self::RightHip => (RightShoulder, RightHip, RightKnee),
            Self::LeftKnee => (LeftHip, LeftKnee, LeftAnkle),
            Self::RightKnee => (RightHip, RightKnee, RightAnkle),
            Self::LeftHipKnee => (RightHip, LeftHip, LeftKnee),
            Self::RightHipKnee => (LeftHip, RightHip, RightKnee),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::LeftShoulder => "LEFT_SHOULDER",
            Self::RightShoulder => "RIGHT_SHOULDER",
            Self::LeftElbowShoulders => "LEFT_ELBOW_SHOULDERS",
            Self::RightElbowShoulders => "RIGHT_ELBOW_SHOULDERS",
            Self::LeftElbow => "LEFT_ELBOW",
            Self::RightElbow => "RIGHT_ELBOW",
            Self::LeftHip => "LEFT_HIP",
            Self::RightHip => "RIGHT_HIP",
            Self::LeftKnee => "LEFT_KNEE",
            Self::RightKnee => "RIGHT_KNEE",
            Self::LeftHipKnee => "LEFT_HIP_KNEE",
            Self::RightHipKnee => "RIGHT_HIP_KNEE",
        }
    }
}

/// Two-point angles in image space
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PlanarAngle {
    LeftFoot,
    RightFoot,
    LeftArm,
    RightArm,
}

impl PlanarAngle {
    pub const ALL: [PlanarAngle; 4] = [
        PlanarAngle::LeftFoot,
        PlanarAngle::RightFoot,
        PlanarAngle::LeftArm,
        PlanarAngle::RightArm,
    ];

    /// (from, to)
    pub fn landmarks(&self) -> (LandmarkName, LandmarkName) {
        use LandmarkName::*;
        match self {
            Self::LeftFoot => (LeftAnkle, LeftFootIndex),
            Self::RightFoot => (RightAnkle, RightFootIndex),
            Self::LeftArm => (LeftElbow, LeftWrist),
            Self::RightArm => (RightElbow, RightWrist),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::LeftFoot => "LEFT_FOOT",
            Self::RightFoot => "RIGHT_FOOT",
            Self::LeftArm => "LEFT_ARM",
            Self::RightArm => "RIGHT_ARM",
        }
    }
}

/// Two-point slopes in image space
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SlopeLine {
    Eyes,
}

impl SlopeLine {
    pub fn landmarks(&self) -> (LandmarkName, LandmarkName) {
        match self {
            Self::Eyes => (LandmarkName::LeftEye, LandmarkName::RightEye),
        }
    }
}

/// Image axis of a landmark position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Axis {
    X,
    Y,
}

/// A named scalar a predicate can read
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Feature {
    Angle(JointAngle),
    PlanarAngle(PlanarAngle),
    Slope(SlopeLine),
    FaceDirectionX,
    FaceDirectionY,
    Position(LandmarkName, Axis),
}

impl Feature {
    /// Normalized x of a landmark (grows to the right of the image)
    pub const fn x(landmark: LandmarkName) -> Feature {
        Feature::Position(landmark, Axis::X)
    }

    /// Normalized y of a landmark (grows downward)
    pub const fn y(landmark: LandmarkName) -> Feature {
        Feature::Position(landmark, Axis::Y)
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Feature::Angle(a) => write!(f, "ANGLE_{}", a.as_str()),
            Feature::PlanarAngle(a) => write!(f, "ANGLE2D_{}", a.as_str()),
            Feature::Slope(SlopeLine::Eyes) => f.write_str("SLOPE_EYES"),
            Feature::FaceDirectionX => f.write_str("FACE_DIRECTION_X"),
            Feature::FaceDirectionY => f.write_str("FACE_DIRECTION_Y"),
            Feature::Position(lm, Axis::X) => write!(f, "{}.x", lm),
            Feature::Position(lm, Axis::Y) => write!(f, "{}.y", lm),
        }
    }
}

/// Immutable per-frame feature vector.
///
/// Only available values are stored; a lookup of anything else returns `None`,
/// which predicates treat as "condition not met".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureState {
    timestamp: Timestamp,
    values: BTreeMap<Feature, f64>,
}

impl FeatureState {
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            values: BTreeMap::new(),
        }
    }

    /// Build a state from explicit values (handy for tests and replays)
    pub fn from_values(
        timestamp: Timestamp,
        values: impl IntoIterator<Item = (Feature, f64)>,
    ) -> Self {
        Self {
            timestamp,
            values: values.into_iter().collect(),
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn get(&self, feature: Feature) -> Option<f64> {
        self.values.get(&feature).copied()
    }

    /// Record a value; `None` leaves the feature unavailable
    pub fn set(&mut self, feature: Feature, value: Option<f64>) {
        match value {
            Some(v) => {
                self.values.insert(feature, v);
            }
            None => {
                self.values.remove(&feature);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }
}

/// Angle at `b` between `ba` and `bc`, in degrees (0..=180).
/// Degenerate (zero-length) arms have no angle.
pub fn joint_angle(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> Option<f64> {
    let ba = [a[0] - b[0], a[1] - b[1], a[2] - b[2]];
    let bc = [c[0] - b[0], c[1] - b[1], c[2] - b[2]];
    let dot = ba[0] * bc[0] + ba[1] * bc[1] + ba[2] * bc[2];
    let norm = (ba.iter().map(|v| v * v).sum::<f64>() * bc.iter().map(|v| v * v).sum::<f64>()).sqrt();
    if norm <= f64::EPSILON {
        return None;
    }
    Some((dot / norm).clamp(-1.0, 1.0).acos().to_degrees())
}

/// Slope of the line from `a` to `b`; vertical lines have none.
pub fn slope(a: [f64; 2], b: [f64; 2]) -> Option<f64> {
    let dx = b[0] - a[0];
    if dx.abs() <= f64::EPSILON {
        return None;
    }
    Some((b[1] - a[1]) / dx)
}

/// Direction of `a → b` in image space, in degrees (-180..=180), measured
/// counter-clockwise from the image x axis with y flipped to point up: a vector
/// pointing up-right lies in 0..90 and one pointing straight down is -90.
pub fn planar_angle(a: [f64; 2], b: [f64; 2]) -> Option<f64> {
    let dx = b[0] - a[0];
    let dy = a[1] - b[1];
    if dx.abs() <= f64::EPSILON && dy.abs() <= f64::EPSILON {
        return None;
    }
    Some(dy.atan2(dx).to_degrees())
}

/// Converts pose frames into feature vectors
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    /// Landmarks scoring below this are unavailable
    pub visibility_threshold: f64,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self {
            visibility_threshold: 0.5,
        }
    }
}

impl FeatureExtractor {
    pub fn new(visibility_threshold: f64) -> Self {
        Self {
            visibility_threshold,
        }
    }

    /// Compute every feature for a frame.
    ///
    /// Occluded landmarks are not an error: features depending on them are left
    /// out. Non-finite coordinates from the provider are, since they would
    /// silently poison every comparison downstream.
    pub fn extract(&self, frame: &PoseFrame) -> Result<FeatureState, FrameError> {
        let threshold = self.visibility_threshold;
        let mut state = FeatureState::new(frame.timestamp);

        for name in LandmarkName::ALL {
            if let Some(lm) = frame.visible(name, threshold) {
                state.set(Feature::x(name), Some(lm.pose[0]));
                state.set(Feature::y(name), Some(lm.pose[1]));
            }
        }

        let world = |name| frame.visible(name, threshold).and_then(|l| l.world);
        let image = |name| frame.visible(name, threshold).map(|l| l.pose);

        for angle in JointAngle::ALL {
            let (a, b, c) = angle.landmarks();
            let value = match (world(a), world(b), world(c)) {
                (Some(a), Some(b), Some(c)) => joint_angle(a, b, c),
                _ => None,
            };
            state.set(Feature::Angle(angle), value);
        }

        for angle in PlanarAngle::ALL {
            let (a, b) = angle.landmarks();
            let value = match (image(a), image(b)) {
                (Some(a), Some(b)) => planar_angle(a, b),
                _ => None,
            };
            state.set(Feature::PlanarAngle(angle), value);
        }

        let (a, b) = SlopeLine::Eyes.landmarks();
        let eyes = match (image(a), image(b)) {
            (Some(a), Some(b)) => slope(a, b),
            _ => None,
        };
        state.set(Feature::Slope(SlopeLine::Eyes), eyes);

        if let Some(face) = frame.face_direction {
            state.set(Feature::FaceDirectionX, Some(face.x));
            state.set(Feature::FaceDirectionY, Some(face.y));
        }

        if let Some((feature, value)) = state.iter().find(|(_, v)| !v.is_finite()) {
            return Err(FrameError::NonFiniteFeature {
                feature: feature.to_string(),
                value,
            });
        }

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::landmarks::Landmark;

    fn lm(x: f64, y: f64) -> Landmark {
        Landmark::new([x, y], [x, y, 0.0], 0.9)
    }

    #[test]
    fn test_joint_angle_right_angle() {
        let angle = joint_angle([1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0]).unwrap();
        assert!((angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_joint_angle_straight() {
        let angle = joint_angle([-1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]).unwrap();
        assert!((angle - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_joint_angle_degenerate() {
        assert!(joint_angle([0.0; 3], [0.0; 3], [1.0, 0.0, 0.0]).is_none());
    }

    #[test]
    fn test_slope() {
        assert_eq!(slope([0.0, 0.0], [2.0, 1.0]), Some(0.5));
        assert_eq!(slope([1.0, 0.0], [1.0, 3.0]), None);
    }

    #[test]
    fn test_planar_angle_quadrants() {
        // Up-right in image space (smaller y is higher)
        let up_right = planar_angle([0.0, 0.0], [1.0, -1.0]).unwrap();
        assert!((up_right - 45.0).abs() < 1e-9);
        let up_left = planar_angle([0.0, 0.0], [-1.0, -1.0]).unwrap();
        assert!((up_left - 135.0).abs() < 1e-9);
        let down = planar_angle([0.5, 0.5], [0.5, 0.9]).unwrap();
        assert!((down + 90.0).abs() < 1e-9);
        assert!(planar_angle([0.5, 0.5], [0.5, 0.5]).is_none());
    }

    #[test]
    fn test_extract_positions_and_angles() {
        let frame = PoseFrame::empty(Timestamp::from_millis(10))
            .with_landmark(LandmarkName::LeftShoulder, lm(0.0, 0.0))
            .with_landmark(LandmarkName::LeftElbow, lm(1.0, 0.0))
            .with_landmark(LandmarkName::LeftWrist, lm(1.0, 1.0))
            .with_face_direction(4.0, -12.0);

        let state = FeatureExtractor::default().extract(&frame).unwrap();
        assert_eq!(state.timestamp(), Timestamp::from_millis(10));
        assert_eq!(state.get(Feature::x(LandmarkName::LeftElbow)), Some(1.0));
        assert_eq!(state.get(Feature::y(LandmarkName::LeftWrist)), Some(1.0));

        let elbow = state.get(Feature::Angle(JointAngle::LeftElbow)).unwrap();
        assert!((elbow - 90.0).abs() < 1e-9);

        assert_eq!(state.get(Feature::FaceDirectionY), Some(-12.0));
        // Right arm was never seen
        assert_eq!(state.get(Feature::Angle(JointAngle::RightElbow)), None);
    }

    #[test]
    fn test_extract_hides_occluded_landmarks() {
        let frame = PoseFrame::empty(Timestamp::from_millis(0))
            .with_landmark(LandmarkName::LeftShoulder, lm(0.0, 0.0))
            .with_landmark(LandmarkName::LeftElbow, lm(1.0, 0.0))
            .with_landmark(
                LandmarkName::LeftWrist,
                Landmark::new([1.0, 1.0], [1.0, 1.0, 0.0], 0.2),
            );

        let state = FeatureExtractor::new(0.5).extract(&frame).unwrap();
        assert_eq!(state.get(Feature::x(LandmarkName::LeftWrist)), None);
        assert_eq!(state.get(Feature::Angle(JointAngle::LeftElbow)), None);
        assert!(state.get(Feature::x(LandmarkName::LeftElbow)).is_some());
    }

    #[test]
    fn test_extract_rejects_non_finite_coordinates() {
        let frame = PoseFrame::empty(Timestamp::from_millis(0))
            .with_landmark(LandmarkName::Nose, lm(f64::NAN, 0.2));

        let err = FeatureExtractor::default().extract(&frame).unwrap_err();
        assert!(matches!(err, FrameError::NonFiniteFeature { .. }));
    }

    #[test]
    fn test_feature_display_names() {
        assert_eq!(Feature::Angle(JointAngle::LeftKnee).to_string(), "ANGLE_LEFT_KNEE");
        assert_eq!(Feature::PlanarAngle(PlanarAngle::RightFoot).to_string(), "ANGLE2D_RIGHT_FOOT");
        assert_eq!(Feature::y(LandmarkName::Nose).to_string(), "NOSE.y");
        assert_eq!(Feature::FaceDirectionX.to_string(), "FACE_DIRECTION_X");
    }

    #[test]
    fn test_feature_state_set_none_removes() {
        let mut state = FeatureState::new(Timestamp::default());
        state.set(Feature::FaceDirectionX, Some(1.0));
        assert_eq!(state.len(), 1);
        state.set(Feature::FaceDirectionX, None);
        assert!(state.is_empty());
    }
}
