//! Monotonic frame time.

use std::time::{
  Duration,
  Instant,
};

use once_cell::sync::Lazy;

/// Frame time or delay in nanoseconds.
///
/// Signed because a finished transition reports how far past its goal it was
/// checked as a negative delay.
pub type Nanos = i64;

pub const NANOS_PER_MILLI: Nanos = 1_000_000;
pub const NANOS_PER_SECOND: Nanos = 1_000_000_000;

static EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// Current monotonic time in nanoseconds since the first call in this process.
pub fn now() -> Nanos {
  to_nanos(EPOCH.elapsed())
}

/// Convert a duration, saturating at `Nanos::MAX`.
pub fn to_nanos(duration: Duration) -> Nanos {
  Nanos::try_from(duration.as_nanos()).unwrap_or(Nanos::MAX)
}

/// Convert a non-negative nanosecond count back into a duration.
pub fn to_duration(nanos: Nanos) -> Duration {
  Duration::from_nanos(u64::try_from(nanos).unwrap_or(0))
}
