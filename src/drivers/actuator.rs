//! Output bank driver.
//!
//! Six independent channels, each driven to the same level: `On` maps to
//! the maximum signal level, `Off` to zero.
//!
//! ## Safety contract
//!
//! Every apply attempts all channels, even after a failure, so an `Off`
//! de-energizes as many outputs as possible. Any failure fails the whole
//! apply. The driver keeps no record of channel state; re-applying is
//! always safe.

use log::warn;

use crate::app::ports::OutputPort;
use crate::control::hysteresis::Command;
use crate::error::ActuatorError;

pub const CHANNEL_COUNT: u8 = 6;
pub const LEVEL_MAX: u8 = 15;
pub const LEVEL_OFF: u8 = 0;

pub struct ActuatorDriver<A> {
    port: Option<A>,
}

impl<A: OutputPort> ActuatorDriver<A> {
    pub fn new(port: Option<A>) -> Self {
        Self { port }
    }

    pub fn apply(&mut self, command: Command) -> Result<(), ActuatorError> {
        let port = self
            .port
            .as_mut()
            .ok_or(ActuatorError::ActuatorUnavailable)?;
        let level = match command {
            Command::On => LEVEL_MAX,
            Command::Off => LEVEL_OFF,
        };

        let mut first_failed = None;
        let mut failed = 0u8;
        for channel in 0..CHANNEL_COUNT {
            if let Err(e) = port.set_output(channel, level) {
                warn!("Output: channel {} set to {} failed: {}", channel, level, e);
                first_failed.get_or_insert(channel);
                failed += 1;
            }
        }

        match first_failed {
            None => Ok(()),
            Some(channel) => Err(ActuatorError::ActuatorWriteFailed { channel, failed }),
        }
    }

    pub fn port(&self) -> Option<&A> {
        self.port.as_ref()
    }

    pub fn port_mut(&mut self) -> Option<&mut A> {
        self.port.as_mut()
    }
}
