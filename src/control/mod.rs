//! Control law.

pub mod hysteresis;
