//! Unified error types for the energy monitor.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! control loop's error handling uniform. Sensor and actuator variants are
//! non-fatal by policy: the loop logs them and carries on. Anything else
//! reaching the loop boundary is fatal and triggers the fail-safe Off.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Error {
    /// The energy store could not be read (non-fatal).
    Sensor(SensorError),
    /// The output bank could not be driven (non-fatal).
    Actuator(ActuatorError),
    /// A reading arrived with a timestamp earlier than the newest history
    /// entry. History ordering can no longer be trusted.
    Clock { newest: f64, offered: f64 },
    /// Configuration is invalid.
    Config(&'static str),
}

impl Error {
    /// Whether the control loop must stop (after a fail-safe Off).
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Sensor(_) | Self::Actuator(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Clock { newest, offered } => write!(
                f,
                "clock: reading at {offered:.3}s is older than newest entry at {newest:.3}s"
            ),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// No sensor device is configured.
    SensorUnavailable,
    /// An accessor call raised an error.
    SensorReadFailed,
    /// Every telemetry strategy was exhausted without a usable pair.
    NoRecognizedMethod,
    /// A strategy succeeded but reported a maximum of zero.
    ZeroCapacity,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorUnavailable => write!(f, "no sensor device configured"),
            Self::SensorReadFailed => write!(f, "accessor call failed"),
            Self::NoRecognizedMethod => write!(f, "no recognized telemetry method"),
            Self::ZeroCapacity => write!(f, "store reports zero capacity"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// No output device is configured.
    ActuatorUnavailable,
    /// One or more channel writes failed. `channel` is the first failure.
    ActuatorWriteFailed { channel: u8, failed: u8 },
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ActuatorUnavailable => write!(f, "no output device configured"),
            Self::ActuatorWriteFailed { channel, failed } => write!(
                f,
                "{failed} channel write(s) failed, first on channel {channel}"
            ),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_clock_and_config_are_fatal() {
        assert!(!Error::from(SensorError::ZeroCapacity).is_fatal());
        assert!(!Error::from(ActuatorError::ActuatorUnavailable).is_fatal());
        assert!(Error::Clock { newest: 2.0, offered: 1.0 }.is_fatal());
        assert!(Error::Config("bad").is_fatal());
    }

    #[test]
    fn write_failure_names_first_channel() {
        let e = ActuatorError::ActuatorWriteFailed { channel: 3, failed: 1 };
        assert_eq!(e.to_string(), "1 channel write(s) failed, first on channel 3");
    }
}
