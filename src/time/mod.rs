//! Monotonic timing module
//!
//! This module provides the clock shared by the whole pipeline:
//! - Monotonic (never goes backward)
//! - Microsecond resolution
//! - Deadline-friendly (timestamps convert back to `Instant`)

pub mod timebase;

pub use timebase::{Timebase, Timestamp};
