//! Bounded reading history.
//!
//! Readings are kept in a fixed-capacity ring (`heapless::Deque`), so the
//! memory bound holds even if the runtime limits are misconfigured. On top
//! of that, two runtime limits apply on every append:
//!
//! 1. **Age**: entries older than `newest - duration` are dropped from the
//!    front. Entries are time-ordered, so the scan stops at the first
//!    retained entry.
//! 2. **Count**: if more than `max_len` entries remain, the oldest excess
//!    is dropped regardless of age. This covers clock jumps that would
//!    otherwise keep an enormous span "fresh".

use heapless::Deque;

use crate::error::Error;

/// Compile-time upper bound on `max_history_size`.
pub const HISTORY_CAPACITY: usize = 2048;

/// Size the emergency trim cuts the history down to.
pub const EMERGENCY_TRIM_LEN: usize = 10;

/// One normalized sample from the energy store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Monotonic seconds.
    pub timestamp: f64,
    pub current_energy: f64,
    pub max_energy: f64,
}

pub struct HistoryBuffer {
    entries: Deque<Reading, HISTORY_CAPACITY>,
    duration_secs: f64,
    max_len: usize,
}

impl HistoryBuffer {
    /// `max_len` is clamped to [`HISTORY_CAPACITY`]; config validation
    /// rejects larger values before they get here.
    pub fn new(duration_secs: f64, max_len: usize) -> Self {
        Self {
            entries: Deque::new(),
            duration_secs,
            max_len: max_len.clamp(1, HISTORY_CAPACITY),
        }
    }

    /// Append a reading and enforce both limits.
    ///
    /// A reading older than the current newest entry breaks the ordering
    /// invariant and is refused with [`Error::Clock`].
    pub fn append(&mut self, reading: Reading) -> Result<(), Error> {
        if let Some(newest) = self.entries.back() {
            if reading.timestamp < newest.timestamp {
                return Err(Error::Clock {
                    newest: newest.timestamp,
                    offered: reading.timestamp,
                });
            }
        }

        // The oldest entry would be evicted by the count limit anyway;
        // dropping it first keeps the push infallible at full capacity.
        if self.entries.len() >= self.max_len {
            self.entries.pop_front();
        }
        // Cannot fail: len < max_len <= capacity after the pop above.
        let _ = self.entries.push_back(reading);

        self.enforce_bounds();
        Ok(())
    }

    /// Re-apply the age and count limits relative to the newest entry.
    pub fn enforce_bounds(&mut self) {
        let Some(newest) = self.entries.back().map(|r| r.timestamp) else {
            return;
        };
        let cutoff = newest - self.duration_secs;
        while let Some(front) = self.entries.front() {
            if front.timestamp < cutoff {
                self.entries.pop_front();
            } else {
                break;
            }
        }
        while self.entries.len() > self.max_len {
            self.entries.pop_front();
        }
    }

    /// Safety valve: keep only the newest `keep` entries.
    /// Returns the number of entries dropped.
    pub fn emergency_trim(&mut self, keep: usize) -> usize {
        let mut dropped = 0;
        while self.entries.len() > keep {
            self.entries.pop_front();
            dropped += 1;
        }
        dropped
    }

    /// Entries oldest-first.
    pub fn entries(&self) -> impl Iterator<Item = &Reading> {
        self.entries.iter()
    }

    pub fn newest(&self) -> Option<&Reading> {
        self.entries.back()
    }

    pub fn oldest(&self) -> Option<&Reading> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
