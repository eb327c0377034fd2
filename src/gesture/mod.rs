//! Gesture recognition
//!
//! - [`predicate`]: null-safe condition trees over feature vectors
//! - [`library`]: gesture definitions and exclusion groups
//! - [`detector`]: the per-frame checkpoint state machine

pub mod predicate;
pub mod library;
pub mod detector;

pub use predicate::{Comparison, Operand, Predicate};
pub use library::{
    CheckpointSpec, ExclusionGroup, GestureDefinition, GestureKind, GestureLibrary,
    GestureThresholds,
};
pub use detector::{GestureDetector, GestureEvent};
