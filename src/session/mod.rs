//! Session orchestration
//!
//! - [`source`]: where pose frames come from
//! - [`processor`]: per-frame extraction and detection with error isolation
//! - [`runtime`]: the capture, dispatch and mouse threads and their shutdown

pub mod source;
pub mod processor;
pub mod runtime;

pub use source::{MemorySource, PoseSource, ReplaySource};
pub use processor::{FrameOutcome, FrameProcessor};
pub use runtime::{Session, SessionHandle, SessionOptions, SessionReport, StopSignal};
