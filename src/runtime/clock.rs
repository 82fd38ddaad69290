//! Monotonic millisecond clocks

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Milliseconds on a monotonic, process-relative time line
pub type Millis = u64;

/// Source of monotonic time for the scheduler and everything built on it
pub trait Clock {
    /// Current time in milliseconds. Never decreases.
    fn now_ms(&self) -> Millis;
}

/// Wall-independent clock backed by [`Instant`]
///
/// Time zero is the moment the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Creates a clock starting at zero now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> Millis {
        saturating_millis(self.origin.elapsed())
    }
}

/// Whole milliseconds in `elapsed`, pinned at [`Millis::MAX`]
fn saturating_millis(elapsed: Duration) -> Millis {
    Millis::try_from(elapsed.as_millis()).unwrap_or(Millis::MAX)
}

/// Hand-driven clock for tests and script replay
///
/// Clones share the same time line, so a test can keep one copy and give
/// another to the scheduler.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Millis>>,
}

impl ManualClock {
    /// Creates a clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock at the given time
    pub fn starting_at(now: Millis) -> Self {
        let clock = Self::new();
        clock.set(now);
        clock
    }

    /// Moves the clock forward by `delta` milliseconds
    pub fn advance(&self, delta: Millis) {
        self.now.set(self.now.get().saturating_add(delta));
    }

    /// Jumps to an absolute time. Earlier times are ignored to keep the clock monotonic.
    pub fn set(&self, now: Millis) {
        if now > self.now.get() {
            self.now.set(now);
        }
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.get()
    }
}
