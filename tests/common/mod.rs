//! Synthetic poses shared by the integration tests
//!
//! Image coordinates: x grows to the right of the picture, y grows downward.
//! The subject faces the camera, so their left side sits at larger x.

#![allow(dead_code)]

use motion_map::pose::{Landmark, LandmarkName, PoseFrame};
use motion_map::time::timebase::Timestamp;

use LandmarkName::*;

/// Mutable pose description turned into frames
#[derive(Debug, Clone)]
pub struct Pose {
    frame: PoseFrame,
}

impl Pose {
    /// Standing upright, arms relaxed, feet pointing at the camera
    pub fn neutral() -> Self {
        let mut pose = Self {
            frame: PoseFrame::empty(Timestamp::default()),
        };
        for (name, x, y) in [
            (Nose, 0.50, 0.20),
            (LeftEye, 0.52, 0.18),
            (RightEye, 0.48, 0.18),
            (LeftShoulder, 0.60, 0.30),
            (RightShoulder, 0.40, 0.30),
            (LeftElbow, 0.62, 0.42),
            (RightElbow, 0.38, 0.42),
            (LeftWrist, 0.63, 0.52),
            (RightWrist, 0.37, 0.52),
            (LeftHip, 0.56, 0.55),
            (RightHip, 0.44, 0.55),
            (LeftKnee, 0.56, 0.72),
            (RightKnee, 0.44, 0.72),
            (LeftAnkle, 0.56, 0.90),
            (RightAnkle, 0.44, 0.90),
            (LeftFootIndex, 0.56, 0.95),
            (RightFootIndex, 0.44, 0.95),
        ] {
            pose = pose.at(name, x, y);
        }
        pose.frame.face_direction = Some(motion_map::pose::FaceDirection { x: 0.0, y: 0.0 });
        pose
    }

    /// Place a landmark; world coordinates mirror the image with zero depth
    pub fn at(self, name: LandmarkName, x: f64, y: f64) -> Self {
        self.at_depth(name, x, y, 0.0)
    }

    pub fn at_depth(mut self, name: LandmarkName, x: f64, y: f64, z: f64) -> Self {
        self.frame
            .landmarks
            .insert(name, Landmark::new([x, y], [x, y, z], 0.95));
        self
    }

    /// Drop a landmark's visibility below any sensible threshold
    pub fn hidden(mut self, name: LandmarkName) -> Self {
        if let Some(lm) = self.frame.landmarks.get_mut(&name) {
            lm.visibility = Some(0.1);
        }
        self
    }

    pub fn facing(mut self, x: f64, y: f64) -> Self {
        self.frame.face_direction = Some(motion_map::pose::FaceDirection { x, y });
        self
    }

    /// Both wrists above the head
    pub fn hands_up(self) -> Self {
        self.at(LeftWrist, 0.62, 0.10).at(RightWrist, 0.38, 0.10)
    }

    /// Left wrist raised above the shoulder and out to the side
    pub fn left_hand_raised(self) -> Self {
        self.at(LeftWrist, 0.70, 0.20)
    }

    /// Right wrist raised above the shoulder and out to the side
    pub fn right_hand_raised(self) -> Self {
        self.at(RightWrist, 0.30, 0.20)
    }

    /// Wrists crossed in front of the chest with bent elbows
    pub fn hands_crossed(self) -> Self {
        self.at(LeftElbow, 0.62, 0.45)
            .at(RightElbow, 0.38, 0.45)
            .at(LeftWrist, 0.42, 0.35)
            .at(RightWrist, 0.58, 0.35)
    }

    /// Left knee lifted toward the camera, foot still pointing down
    pub fn left_knee_up(self) -> Self {
        self.at_depth(LeftKnee, 0.56, 0.62, -0.15)
            .at_depth(LeftAnkle, 0.56, 0.80, -0.05)
            .at_depth(LeftFootIndex, 0.56, 0.85, -0.05)
    }

    /// Both knees deeply bent
    pub fn squatting(self) -> Self {
        self.at_depth(LeftKnee, 0.58, 0.68, -0.15)
            .at_depth(RightKnee, 0.42, 0.68, -0.15)
            .at(LeftAnkle, 0.56, 0.85)
            .at(RightAnkle, 0.44, 0.85)
            .at(LeftFootIndex, 0.56, 0.90)
            .at(RightFootIndex, 0.44, 0.90)
    }

    /// Both feet turned toward the image right (the subject's left)
    pub fn feet_turned_left(self) -> Self {
        let (lx, ly) = self.xy(LeftAnkle);
        let (rx, ry) = self.xy(RightAnkle);
        self.at(LeftFootIndex, lx + 0.04, ly - 0.02)
            .at(RightFootIndex, rx + 0.04, ry - 0.02)
    }

    fn xy(&self, name: LandmarkName) -> (f64, f64) {
        let lm = &self.frame.landmarks[&name];
        (lm.pose[0], lm.pose[1])
    }

    pub fn frame(&self, millis: u64) -> PoseFrame {
        let mut frame = self.frame.clone();
        frame.timestamp = Timestamp::from_millis(millis);
        frame
    }
}
