//! Application core: the monitoring pipeline, zero direct I/O.
//!
//! All interaction with devices, time, and the presentation layer happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real hardware.

pub mod control_loop;
pub mod events;
pub mod ports;
