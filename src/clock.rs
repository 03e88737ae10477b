//! Clock Module
//!
//! Monotonic time source used for cache expiry. Wall-clock adjustments never
//! affect expiry because every timestamp is a `std::time::Instant`.

use std::fmt::Debug;
use std::sync::Mutex;
use std::time::{Duration, Instant};

// == Clock Trait ==
/// Source of monotonic timestamps.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current monotonic instant.
    fn now(&self) -> Instant;
}

// == System Clock ==
/// Clock backed by `Instant::now()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// == Manual Clock ==
/// Clock that only moves when told to.
///
/// Starts at the instant it was created and advances by explicit calls to
/// [`ManualClock::advance`]. Used to test expiry without sleeping.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut offset = self
            .offset
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *offset += by;
    }

    /// Total time advanced since creation.
    pub fn elapsed(&self) -> Duration {
        *self
            .offset
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }
}
