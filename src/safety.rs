//! Fail-safe shutdown.
//!
//! The output bank is forced to `Off` exactly once on:
//!
//! 1. graceful cancellation,
//! 2. a fatal error escaping the loop body,
//! 3. a panic unwinding out of the loop body.
//!
//! The attempt is never retried: shutdown must finish promptly even if the
//! device is wedged. A failure is logged and otherwise ignored.
//!
//! Device calls have no timeout. A hung `set_output` stalls the shutdown
//! the same way it would stall a tick; a timed-out write would have to be
//! treated as failed, not as done.

use log::{error, info};

use crate::app::ports::OutputPort;
use crate::control::hysteresis::{Command, HysteresisController};
use crate::drivers::actuator::ActuatorDriver;

/// Why the fail-safe fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Cancelled,
    Fatal,
    Panic,
}

impl core::fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "cancelled"),
            Self::Fatal => write!(f, "fatal error"),
            Self::Panic => write!(f, "panic"),
        }
    }
}

/// One best-effort `Off`, then mark the controller inactive.
/// Returns whether the write succeeded.
pub fn fail_safe_off<A: OutputPort>(
    driver: &mut ActuatorDriver<A>,
    controller: &mut HysteresisController,
    reason: ShutdownReason,
) -> bool {
    let ok = match driver.apply(Command::Off) {
        Ok(()) => {
            info!("FAIL-SAFE ({reason}): outputs off");
            true
        }
        Err(e) => {
            error!("FAIL-SAFE ({reason}): could not turn outputs off: {e}");
            false
        }
    };
    controller.reset();
    ok
}
