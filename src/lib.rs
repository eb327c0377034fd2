//! # Motion Map
//!
//! A low-latency rule engine that turns a stream of body-pose measurements into
//! virtual keyboard and mouse input, so software can be driven by gestures
//! captured on a camera.
//!
//! ## Overview
//!
//! Each pose frame is reduced to a feature vector (joint angles, slopes, head
//! orientation, landmark positions). A library of gestures, each an ordered
//! list of checkpoints with decay windows, is evaluated against it. Completed
//! gestures are mapped to key presses, mouse-button holds, scroll ticks or an
//! analog mouse-movement vector, and released automatically after a per-kind
//! interval.
//!
//! ## Quick Start
//!
//! ```no_run
//! use motion_map::dispatch::{NoopInjector, SharedSettings};
//! use motion_map::session::{ReplaySource, Session, SessionOptions};
//! use std::sync::Arc;
//!
//! let source = ReplaySource::open("frames.jsonl").expect("open replay");
//! let settings = SharedSettings::default();
//! let handle = Session::start(
//!     Box::new(source),
//!     Arc::new(NoopInjector),
//!     settings,
//!     SessionOptions::default(),
//! )
//! .expect("start session");
//!
//! let report = handle.wait().expect("session failed");
//! println!("{} gestures fired", report.gestures_fired);
//! ```
//!
//! ## Architecture
//!
//! - [`time`]: monotonic timebase and timestamps
//! - [`pose`]: landmark model and feature extraction
//! - [`gesture`]: predicates, gesture library and the checkpoint detector
//! - [`dispatch`]: input mapping, held-input state machine and the dispatch worker
//! - [`mouse`]: the analog mouse-movement integrator
//! - [`session`]: pose sources, frame processing and thread orchestration
//! - [`app`]: CLI and configuration management
//!
//! ## Pipeline
//!
//! ```text
//! ┌────────────┐    ┌────────────┐    ┌────────────┐    ┌────────────┐
//! │ PoseSource │───▶│  Feature   │───▶│  Gesture   │───▶│  Dispatch  │
//! │  (frames)  │    │ Extraction │    │  Detector  │    │   Worker   │
//! └────────────┘    └────────────┘    └────────────┘    └─────┬──────┘
//!                                                             │
//!                          ┌────────────┐    ┌────────────┐   │
//!                          │   Mouse    │◀───│ Direction  │◀──┤
//!                          │ Integrator │    │   Vector   │   ▼
//!                          └────────────┘    └────────────┘  key / button / scroll
//! ```

pub mod time;
pub mod pose;
pub mod gesture;
pub mod dispatch;
pub mod mouse;
pub mod session;
pub mod app;

// Re-export commonly used types
pub use dispatch::{InjectError, InputInjector, InputMapping, SharedSettings};
pub use gesture::{GestureDetector, GestureEvent, GestureKind, GestureLibrary};
pub use pose::{FeatureExtractor, FeatureState, PoseFrame};
pub use session::{Session, SessionHandle, SessionReport};
pub use time::timebase::{Timebase, Timestamp};

/// Result type alias for motion-map
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for motion-map
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Gesture library error: {0}")]
    Library(String),

    #[error("Pose source error: {0}")]
    Source(String),

    #[error("Dispatch error: {0}")]
    Dispatch(String),

    #[error("Input injection error: {0}")]
    Inject(#[from] InjectError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure confined to a single frame; the capture loop drops the frame and continues
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameError {
    #[error("feature {feature} is not finite ({value})")]
    NonFiniteFeature { feature: String, value: f64 },

    #[error("frame timestamp {current} precedes previous frame at {previous}")]
    TimestampRegression {
        previous: Timestamp,
        current: Timestamp,
    },
}
