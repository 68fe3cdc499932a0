//! Output drivers.

pub mod actuator;
