//! Time sources for the tracker.
//!
//! The tracker never caches "now" between calls; it asks its [`Clock`] on every
//! [`advance`](crate::ProgressTracker::advance). Production code uses [`SystemClock`],
//! while [`ManualClock`] lets tests and simulations step time deterministically.

use std::{sync::Arc, time::Duration};

use parking_lot::RwLock;
use web_time::Instant;

/// A source of monotonic instants.
pub trait Clock {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// The monotonic system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying instant, so a test can keep one handle and
/// hand another to the tracker.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Arc<RwLock<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// Creates a clock frozen at the current system instant.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn starting_at(start: Instant) -> Self {
        Self {
            now: Arc::new(RwLock::new(start)),
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.read()
    }
}
