//! Energy store monitor library.
//!
//! Watches an energy store through whatever accessors it exposes, keeps a
//! bounded history, estimates the charge rate, and drives a six-channel
//! output bank with hysteresis. Devices, time, and event presentation are
//! reached only through the traits in [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod diagnostics;
pub mod drivers;
pub mod error;
pub mod history;
pub mod rate;
pub mod safety;
pub mod sensors;
