//! Charge/discharge rate estimation.
//!
//! Two stages:
//!
//! - **Instantaneous**: slope between the newest reading and one reference
//!   reading. The reference is the entry whose age is closest to the target
//!   window, among entries at least `min_elapsed_gate` old; if none clears
//!   the gate, the oldest entry is used.
//! - **Smoothed**: linearly weighted mean over the last accepted
//!   instantaneous samples (oldest weight 1, newest weight n), then
//!   [`ballpark`]-quantized.
//!
//! The result is for reporting only. Control decisions use raw percent.

use heapless::Deque;

use crate::history::{HistoryBuffer, Reading};

/// Compile-time upper bound on `rate_history_size`.
pub const RATE_HISTORY_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateStatus {
    Ok,
    /// Fewer than two readings (or no accepted samples yet).
    InsufficientData,
    /// The chosen reference is not older than the newest reading.
    InsufficientTime,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateEstimate {
    /// EU per second; 0.0 unless `status` is `Ok`.
    pub rate: f64,
    pub status: RateStatus,
}

impl RateEstimate {
    const fn insufficient(status: RateStatus) -> Self {
        Self { rate: 0.0, status }
    }
}

pub struct RateEstimator {
    samples: Deque<f64, RATE_HISTORY_CAPACITY>,
    max_samples: usize,
    target_window_secs: f64,
    min_elapsed_secs: f64,
}

impl RateEstimator {
    pub fn new(max_samples: usize, target_window_secs: f64, min_elapsed_secs: f64) -> Self {
        Self {
            samples: Deque::new(),
            max_samples: max_samples.clamp(1, RATE_HISTORY_CAPACITY),
            target_window_secs,
            min_elapsed_secs,
        }
    }

    /// Slope between the newest reading and the best reference reading.
    pub fn instantaneous(&self, history: &HistoryBuffer) -> RateEstimate {
        if history.len() < 2 {
            return RateEstimate::insufficient(RateStatus::InsufficientData);
        }
        let (Some(newest), Some(oldest)) = (history.newest(), history.oldest()) else {
            return RateEstimate::insufficient(RateStatus::InsufficientData);
        };

        let mut best: Option<(f64, Reading)> = None;
        let candidates = history.len() - 1;
        for entry in history.entries().take(candidates) {
            let elapsed = newest.timestamp - entry.timestamp;
            if elapsed < self.min_elapsed_secs {
                continue;
            }
            let distance = (elapsed - self.target_window_secs).abs();
            if best.is_none_or(|(d, _)| distance < d) {
                best = Some((distance, *entry));
            }
        }
        let reference = best.map_or(*oldest, |(_, entry)| entry);

        let elapsed = newest.timestamp - reference.timestamp;
        if elapsed <= 0.0 {
            return RateEstimate::insufficient(RateStatus::InsufficientTime);
        }
        RateEstimate {
            rate: (newest.current_energy - reference.current_energy) / elapsed,
            status: RateStatus::Ok,
        }
    }

    /// Push an accepted sample, evicting the oldest past `max_samples`.
    pub fn record(&mut self, rate: f64) {
        if self.samples.len() >= self.max_samples {
            self.samples.pop_front();
        }
        let _ = self.samples.push_back(rate);
    }

    /// Weighted mean of the recorded samples, ballpark-quantized.
    pub fn smoothed(&self) -> RateEstimate {
        if self.samples.is_empty() {
            return RateEstimate::insufficient(RateStatus::InsufficientData);
        }
        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        for (i, sample) in self.samples.iter().enumerate() {
            let w = (i + 1) as f64;
            weighted += sample * w;
            total_weight += w;
        }
        RateEstimate {
            rate: ballpark(weighted / total_weight),
            status: RateStatus::Ok,
        }
    }

    /// One tick's worth of work: estimate, record if accepted, smooth.
    pub fn update(&mut self, history: &HistoryBuffer) -> RateEstimate {
        let instant = self.instantaneous(history);
        if instant.status == RateStatus::Ok {
            self.record(instant.rate);
        }
        self.smoothed()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

/// Round to a magnitude-dependent granularity, keeping the sign.
///
/// | magnitude  | granularity |
/// |------------|-------------|
/// | < 1k       | 10          |
/// | < 10k      | 100         |
/// | < 100k     | 1k          |
/// | < 1M       | 10k         |
/// | < 10M      | 100k        |
/// | otherwise  | 1M          |
///
/// Idempotent: a value can only round up to a tier boundary, and every
/// boundary is a multiple of the next tier's granularity.
pub fn ballpark(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let magnitude = value.abs();
    let step = if magnitude < 1_000.0 {
        10.0
    } else if magnitude < 10_000.0 {
        100.0
    } else if magnitude < 100_000.0 {
        1_000.0
    } else if magnitude < 1_000_000.0 {
        10_000.0
    } else if magnitude < 10_000_000.0 {
        100_000.0
    } else {
        1_000_000.0
    };
    (value / step).round() * step
}
