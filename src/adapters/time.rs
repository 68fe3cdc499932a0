//! Monotonic time adapter.
//!
//! Wraps `std::time::Instant`; the origin is the moment the adapter was
//! created.

use std::time::Instant;

use crate::app::ports::Clock;

pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}
