//! Monotonic Timebase
//!
//! Provides microsecond-precision timestamps measured from a process-wide epoch.
//! Pose frames, gesture events and release deadlines all share this clock so
//! that durations computed anywhere in the pipeline are directly comparable.

use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Process-wide epoch, captured on first use
static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Process-wide monotonic clock
///
/// - Monotonic (backed by `Instant`)
/// - Microsecond resolution
/// - Convertible back to `Instant` for deadline-based waits
#[derive(Debug, Clone, Copy)]
pub struct Timebase;

impl Timebase {
    /// Pin the epoch. Safe to call repeatedly; only the first call has an effect.
    pub fn init() {
        EPOCH.get_or_init(Instant::now);
    }

    /// The instant all timestamps are measured from.
    #[inline]
    pub fn epoch() -> Instant {
        *EPOCH.get_or_init(Instant::now)
    }

    /// Current timestamp.
    #[inline]
    pub fn now() -> Timestamp {
        Timestamp::from_instant(Instant::now())
    }

    /// Microseconds elapsed since the epoch.
    #[inline]
    pub fn now_micros() -> u64 {
        Self::now().as_micros()
    }
}

/// A point on the shared clock, stored as microseconds since the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create a timestamp from microseconds since the epoch.
    #[inline]
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Create a timestamp from milliseconds since the epoch.
    #[inline]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(1_000))
    }

    /// Capture the current timestamp.
    #[inline]
    pub fn now() -> Self {
        Timebase::now()
    }

    /// Convert a wall-clock instant onto the shared clock.
    /// Instants before the epoch map to zero.
    pub fn from_instant(instant: Instant) -> Self {
        let since = instant.saturating_duration_since(Timebase::epoch());
        Self(since.as_micros().min(u64::MAX as u128) as u64)
    }

    /// Convert back to an `Instant` (used for deadline waits).
    pub fn to_instant(self) -> Instant {
        Timebase::epoch() + Duration::from_micros(self.0)
    }

    /// Raw microseconds.
    #[inline]
    pub const fn as_micros(&self) -> u64 {
        self.0
    }

    /// Whole milliseconds.
    #[inline]
    pub const fn as_millis(&self) -> u64 {
        self.0 / 1_000
    }

    /// Time elapsed since an earlier timestamp; zero if `earlier` is actually later.
    #[inline]
    pub fn duration_since(&self, earlier: Timestamp) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }

    /// This timestamp shifted forward by `duration` (saturating).
    #[inline]
    pub fn add(&self, duration: Duration) -> Timestamp {
        let micros = duration.as_micros().min(u64::MAX as u128) as u64;
        Timestamp(self.0.saturating_add(micros))
    }

    /// Check if this timestamp is after another.
    #[inline]
    pub fn is_after(&self, other: Timestamp) -> bool {
        self.0 > other.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:03}ms", self.0 / 1_000, self.0 % 1_000)
    }
}

impl serde::Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Frames on disk carry milliseconds, matching camera position stamps
        serializer.serialize_f64(self.0 as f64 / 1_000.0)
    }
}

impl<'de> serde::Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let millis = f64::deserialize(deserializer)?;
        if !millis.is_finite() || millis < 0.0 {
            return Err(serde::de::Error::custom(format!(
                "timestamp must be a non-negative number of milliseconds, got {}",
                millis
            )));
        }
        Ok(Timestamp((millis * 1_000.0).round() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonicity() {
        Timebase::init();
        let t1 = Timebase::now();
        std::thread::sleep(Duration::from_micros(200));
        let t2 = Timebase::now();
        assert!(t2.is_after(t1), "time must advance");
    }

    #[test]
    fn test_unit_conversions() {
        let ts = Timestamp::from_millis(1_500);
        assert_eq!(ts.as_micros(), 1_500_000);
        assert_eq!(ts.as_millis(), 1_500);
    }

    #[test]
    fn test_duration_since_saturates() {
        let t1 = Timestamp::from_millis(1_000);
        let t2 = Timestamp::from_millis(500);
        assert_eq!(t2.duration_since(t1), Duration::ZERO);
        assert_eq!(t1.duration_since(t2), Duration::from_millis(500));
    }

    #[test]
    fn test_add_duration() {
        let ts = Timestamp::from_millis(100).add(Duration::from_millis(300));
        assert_eq!(ts, Timestamp::from_millis(400));

        let saturated = Timestamp::from_micros(u64::MAX).add(Duration::from_secs(1));
        assert_eq!(saturated.as_micros(), u64::MAX);
    }

    #[test]
    fn test_instant_roundtrip() {
        Timebase::init();
        let ts = Timestamp::from_millis(250);
        let back = Timestamp::from_instant(ts.to_instant());
        assert_eq!(back, ts);
    }

    #[test]
    fn test_instant_before_epoch_is_zero() {
        let early = Instant::now();
        Timebase::init();
        // Either the epoch was pinned earlier by another test or just now; both clamp to >= 0.
        let ts = Timestamp::from_instant(early);
        assert!(ts <= Timebase::now());
    }

    #[test]
    fn test_serialization_in_millis() {
        let ts = Timestamp::from_micros(33_500);
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "33.5");

        let back: Timestamp = serde_json::from_str("33.5").unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn test_negative_timestamp_rejected() {
        let result: Result<Timestamp, _> = serde_json::from_str("-1.0");
        assert!(result.is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Timestamp::from_micros(1_234_567).to_string(), "1234.567ms");
    }
}
