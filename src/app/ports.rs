//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlLoop (domain)
//! ```
//!
//! The energy store and the output bank are opaque devices. Every call
//! into them is fallible: an accessor may be missing, may return nothing,
//! or may raise. Adapters translate all three into [`DeviceError`] so the
//! domain never has to reason about what the device "really" is.

use crate::config::MonitorConfig;
use crate::sensors::strategy::Accessor;

// ───────────────────────────────────────────────────────────────
// Device-level errors
// ───────────────────────────────────────────────────────────────

/// Outcome of a single failed device call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The device does not expose this accessor.
    Absent,
    /// The accessor exists but returned nothing usable (null / non-numeric).
    Null,
    /// The accessor raised. Carries the device's message.
    Raised(String),
}

impl core::fmt::Display for DeviceError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Absent => write!(f, "absent"),
            Self::Null => write!(f, "returned no value"),
            Self::Raised(msg) => write!(f, "raised: {}", msg),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: energy store → domain)
// ───────────────────────────────────────────────────────────────

/// One `{amount, capacity}` record as returned by tank-style accessors.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TankLevel {
    pub amount: Option<f64>,
    pub capacity: Option<f64>,
}

/// Sensor capability contract.
///
/// Zero-argument scalar accessors are addressed by [`Accessor`]; the two
/// tank shapes get their own calls because they return records.
pub trait EnergyDevice {
    /// Call a scalar accessor such as `getEUStored`.
    fn scalar(&mut self, accessor: Accessor) -> Result<f64, DeviceError>;

    /// Call the composite `tank` accessor.
    fn tank(&mut self) -> Result<TankLevel, DeviceError>;

    /// Call `getTankInfo(side)`.
    fn tank_info(&mut self, side: u32) -> Result<Vec<TankLevel>, DeviceError>;

    /// Names of every method the device advertises, for diagnostics only.
    fn method_names(&self) -> Vec<String> {
        Vec::new()
    }
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → output bank)
// ───────────────────────────────────────────────────────────────

/// Actuator capability contract: `setOutput(channel, level)`.
pub trait OutputPort {
    fn set_output(&mut self, channel: u8, level: u8) -> Result<(), DeviceError>;
}

// ───────────────────────────────────────────────────────────────
// Time
// ───────────────────────────────────────────────────────────────

/// Monotonic time source.
pub trait Clock {
    /// Seconds since an arbitrary fixed origin. Never decreases.
    fn now_secs(&self) -> f64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / presentation)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`MonitorEvent`](super::events::MonitorEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::MonitorEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads configuration once at startup.
///
/// Implementations MUST run [`MonitorConfig::validate`] and reject invalid
/// ranges rather than clamping them.
pub trait ConfigPort {
    fn load(&self) -> Result<MonitorConfig, ConfigError>;
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No config found at the expected location.
    NotFound,
    /// Stored config failed to deserialize.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the backing store.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}
