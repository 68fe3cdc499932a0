//! Outbound monitor events.
//!
//! The [`ControlLoop`](super::control_loop::ControlLoop) emits these through
//! the [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them: log them, render them, forward them.

use crate::error::{ActuatorError, SensorError};
use crate::rate::RateStatus;
use crate::safety::ShutdownReason;

/// Structured events emitted by the control loop.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// Startup Off has been attempted; the loop is about to run.
    Started,

    /// Per-tick telemetry after a good reading.
    Telemetry(TelemetryData),

    /// The output bank switched.
    ControlChanged { active: bool },

    /// A read was skipped for control purposes.
    SensorFault(SensorError),

    /// A command could not be applied; it will be retried.
    ActuatorFault(ActuatorError),

    /// History was cut down under memory pressure.
    EmergencyTrim { dropped: usize },

    /// The loop has stopped and the fail-safe has run.
    Stopped(ShutdownReason),
}

/// A point-in-time telemetry snapshot suitable for logging or display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryData {
    pub tick: u64,
    /// Charge fraction 0..1.
    pub percent: f64,
    pub current_energy: f64,
    pub max_energy: f64,
    /// Smoothed, ballpark-rounded EU/s.
    pub rate: f64,
    pub rate_status: RateStatus,
    pub active: bool,
    pub history_len: usize,
}
