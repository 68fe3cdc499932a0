//! Two-threshold hysteresis controller for the output bank.
//!
//! ```text
//!            percent <= low
//!   Inactive ──────────────▶ Active
//!      ▲                       │
//!      └───────────────────────┘
//!            percent >= high
//! ```
//!
//! Between the thresholds nothing changes. `evaluate` is pure: it proposes
//! a command but leaves the state alone. The caller must `commit` once the
//! output bank has accepted the command, so a failed write is retried on
//! the next tick instead of being mistaken for the new steady state.

/// Output command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    On,
    Off,
}

impl Command {
    /// Whether the controller is active after this command takes effect.
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

pub struct HysteresisController {
    low: f64,
    high: f64,
    active: bool,
}

impl HysteresisController {
    pub fn new(low: f64, high: f64) -> Self {
        Self {
            low,
            high,
            active: false,
        }
    }

    /// Command implied by `percent` in the current state, if any.
    pub fn evaluate(&self, percent: f64) -> Option<Command> {
        if !self.active && percent <= self.low {
            Some(Command::On)
        } else if self.active && percent >= self.high {
            Some(Command::Off)
        } else {
            None
        }
    }

    /// Record that `command` has been applied.
    pub fn commit(&mut self, command: Command) {
        self.active = command.is_on();
    }

    /// Force back to inactive (startup, shutdown).
    pub fn reset(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
