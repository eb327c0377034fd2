//! Analog mouse channel
//!
//! The dispatcher writes a direction; an independently clocked loop turns it
//! into relative mouse motion proportional to the time elapsed between
//! iterations.

use crate::dispatch::injector::InputInjector;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default cursor speed in units per second at full deflection
pub const DEFAULT_MOUSE_SPEED: f64 = 300.0;

/// Default integrator poll interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Shared `(x, y)` direction, packed into one atomic word so readers never
/// observe a half-updated pair.
#[derive(Debug, Default)]
pub struct DirectionVector {
    bits: AtomicU64,
}

impl DirectionVector {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn pack(x: f32, y: f32) -> u64 {
        ((x.to_bits() as u64) << 32) | y.to_bits() as u64
    }

    #[inline]
    fn unpack(bits: u64) -> (f32, f32) {
        (f32::from_bits((bits >> 32) as u32), f32::from_bits(bits as u32))
    }

    pub fn set(&self, x: f32, y: f32) {
        self.bits.store(Self::pack(x, y), Ordering::Release);
    }

    pub fn get(&self) -> (f32, f32) {
        Self::unpack(self.bits.load(Ordering::Acquire))
    }

    pub fn zero(&self) {
        self.set(0.0, 0.0);
    }

    pub fn is_zero(&self) -> bool {
        let (x, y) = self.get();
        x == 0.0 && y == 0.0
    }
}

/// Converts the shared direction into relative mouse motion
pub struct MouseIntegrator {
    direction: Arc<DirectionVector>,
    injector: Arc<dyn InputInjector>,
    speed: f64,
    poll_interval: Duration,
}

impl MouseIntegrator {
    pub fn new(direction: Arc<DirectionVector>, injector: Arc<dyn InputInjector>) -> Self {
        Self {
            direction,
            injector,
            speed: DEFAULT_MOUSE_SPEED,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// One integration step over `dt`. Components are truncated toward zero;
    /// a zero move is not sent.
    pub fn step(&self, dt: Duration) -> (i32, i32) {
        let (x, y) = self.direction.get();
        let secs = dt.as_secs_f64();
        let dx = (x as f64 * self.speed * secs) as i32;
        let dy = (y as f64 * self.speed * secs) as i32;

        if dx != 0 || dy != 0 {
            if let Err(e) = self.injector.move_relative(dx, dy) {
                warn!(error = %e, dx, dy, "Mouse move failed");
            }
        }
        (dx, dy)
    }

    /// Loop until `stop` is set; the flag is checked once per iteration.
    pub fn run(&self, stop: &AtomicBool) {
        let mut last = Instant::now();
        while !stop.load(Ordering::SeqCst) {
            let now = Instant::now();
            self.step(now.duration_since(last));
            last = now;
            thread::sleep(self.poll_interval);
        }
        debug!("Mouse integrator stopped");
    }

    /// Run on a dedicated `mouse-integrator` thread
    pub fn spawn(self, stop: Arc<AtomicBool>) -> std::io::Result<JoinHandle<()>> {
        info!(
            speed = self.speed,
            poll_ms = self.poll_interval.as_millis() as u64,
            "Starting mouse integrator"
        );
        thread::Builder::new()
            .name("mouse-integrator".into())
            .spawn(move || self.run(&stop))
    }
}
