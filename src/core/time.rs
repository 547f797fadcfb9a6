//! Time sources for the session clock
//!
//! The session never reads the system clock directly; it asks a
//! [`TimeSource`]. [`WallClock`] is used in production, [`ManualClock`] lets
//! tests move time by hand.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use web_time::Instant;

pub trait TimeSource: Send + Sync {
    fn now(&self) -> Instant;
}

/// Monotonic system time
#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock;

impl TimeSource for WallClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-driven time; clones share the same reading
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Total time advanced since creation
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }
}
