use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use tokio::time::Instant;

/// Wall clock duration since the unix epoch; zero if the system clock is
/// set before 1970
pub fn get_duration_since_epoch() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
}

/// return millisecond
pub fn timestamp_millis() -> u64 {
    u64::try_from(get_duration_since_epoch().as_millis()).unwrap_or(u64::MAX)
}

/// Capture-time clock: wall time read once, advanced by the monotonic clock.
///
/// Capture timestamps stay ordered when the system clock is stepped while
/// the collector runs, and follow tokio's clock when it is paused in tests.
#[derive(Debug, Clone, Copy)]
pub struct CaptureClock {
    anchor_ms: u64,
    anchor: Instant,
}

impl CaptureClock {
    pub fn new() -> Self {
        Self::with_anchor(timestamp_millis())
    }

    pub fn with_anchor(anchor_ms: u64) -> Self {
        Self {
            anchor_ms,
            anchor: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        let elapsed = u64::try_from(self.anchor.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.anchor_ms.saturating_add(elapsed)
    }
}

impl Default for CaptureClock {
    fn default() -> Self {
        Self::new()
    }
}
