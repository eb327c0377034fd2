//! Pose input module
//!
//! The landmark model delivered by the pose provider and the geometry that
//! turns it into gesture features.

pub mod landmarks;
pub mod features;

pub use landmarks::{FaceDirection, Landmark, LandmarkName, PoseFrame};
pub use features::{Axis, Feature, FeatureExtractor, FeatureState, JointAngle, PlanarAngle, SlopeLine};
