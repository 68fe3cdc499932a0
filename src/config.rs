//! System configuration parameters
//!
//! All tunable parameters for the monitor. Loaded once at startup through a
//! [`ConfigPort`](crate::app::ports::ConfigPort) and immutable afterwards.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::history::HISTORY_CAPACITY;
use crate::rate::RATE_HISTORY_CAPACITY;

/// Core monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    // --- Hysteresis ---
    /// Charge fraction (0..1) at or below which the output turns on
    pub low_threshold: f64,
    /// Charge fraction (0..1) at or above which the output turns off
    pub high_threshold: f64,

    // --- Timing ---
    /// Control tick period (seconds)
    pub check_interval_secs: u32,

    // --- History ---
    /// Maximum age span kept in the reading history (seconds)
    pub history_duration_secs: f64,
    /// Maximum number of readings kept regardless of age
    pub max_history_size: usize,

    // --- Rate estimation ---
    /// Number of accepted rate samples used for smoothing
    pub rate_history_size: usize,
    /// Preferred span between the two readings of a rate estimate (seconds)
    #[serde(default = "default_target_rate_window")]
    pub target_rate_window_secs: f64,
    /// Minimum span for a reference reading to be preferred (seconds)
    #[serde(default = "default_min_elapsed_gate")]
    pub min_elapsed_gate_secs: f64,
}

fn default_target_rate_window() -> f64 {
    10.0
}

fn default_min_elapsed_gate() -> f64 {
    3.0
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            low_threshold: 0.20,
            high_threshold: 0.90,

            check_interval_secs: 1,

            history_duration_secs: 60.0,
            max_history_size: 120,

            rate_history_size: 10,
            target_rate_window_secs: default_target_rate_window(),
            min_elapsed_gate_secs: default_min_elapsed_gate(),
        }
    }
}

impl MonitorConfig {
    /// Range-check every field. Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.low_threshold) {
            return Err(ConfigError::ValidationFailed(
                "low_threshold must be 0.0–1.0",
            ));
        }
        if !(0.0..=1.0).contains(&self.high_threshold) {
            return Err(ConfigError::ValidationFailed(
                "high_threshold must be 0.0–1.0",
            ));
        }
        if self.low_threshold >= self.high_threshold {
            return Err(ConfigError::ValidationFailed(
                "low_threshold must be < high_threshold",
            ));
        }
        if self.check_interval_secs < 1 {
            return Err(ConfigError::ValidationFailed(
                "check_interval_secs must be >= 1",
            ));
        }
        if !(self.history_duration_secs.is_finite() && self.history_duration_secs > 0.0) {
            return Err(ConfigError::ValidationFailed(
                "history_duration_secs must be > 0",
            ));
        }
        if !(1..=HISTORY_CAPACITY).contains(&self.max_history_size) {
            return Err(ConfigError::ValidationFailed(
                "max_history_size must be 1–2048",
            ));
        }
        if !(1..=RATE_HISTORY_CAPACITY).contains(&self.rate_history_size) {
            return Err(ConfigError::ValidationFailed(
                "rate_history_size must be 1–256",
            ));
        }
        if !(self.target_rate_window_secs.is_finite() && self.target_rate_window_secs > 0.0) {
            return Err(ConfigError::ValidationFailed(
                "target_rate_window_secs must be > 0",
            ));
        }
        if !(self.min_elapsed_gate_secs.is_finite() && self.min_elapsed_gate_secs >= 0.0) {
            return Err(ConfigError::ValidationFailed(
                "min_elapsed_gate_secs must be >= 0",
            ));
        }
        Ok(())
    }

    /// Tick period as a `Duration`.
    pub fn check_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.check_interval_secs))
    }
}
