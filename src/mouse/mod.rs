//! Mouse movement
//!
//! The shared direction vector and the integrator thread that reads it.

pub mod integrator;

pub use integrator::{DirectionVector, MouseIntegrator, DEFAULT_MOUSE_SPEED, DEFAULT_POLL_INTERVAL};
