//! Telemetry strategies, in probe priority order.
//!
//! Each strategy names one accessor shape an energy store might expose.
//! A strategy either yields a complete `(current, max)` pair from its own
//! accessors or fails; values are never mixed across strategies.

use crate::app::ports::{DeviceError, EnergyDevice, TankLevel};

/// Zero-argument scalar accessors known to the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accessor {
    GetEuStored,
    GetEuCapacity,
    GetStoredEu,
    GetCapacityEu,
    GetEnergyStored,
    GetMaxEnergyStored,
    GetStored,
    GetCapacity,
}

impl Accessor {
    /// Method name on the device.
    pub const fn name(self) -> &'static str {
        match self {
            Self::GetEuStored => "getEUStored",
            Self::GetEuCapacity => "getEUCapacity",
            Self::GetStoredEu => "getStoredEU",
            Self::GetCapacityEu => "getCapacityEU",
            Self::GetEnergyStored => "getEnergyStored",
            Self::GetMaxEnergyStored => "getMaxEnergyStored",
            Self::GetStored => "getStored",
            Self::GetCapacity => "getCapacity",
        }
    }
}

/// Why a strategy did not produce a pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeFailure {
    /// Accessor (or record field) that failed.
    pub accessor: &'static str,
    pub cause: DeviceError,
}

impl ProbeFailure {
    fn new(accessor: &'static str, cause: DeviceError) -> Self {
        Self { accessor, cause }
    }

    /// True if the device raised rather than simply lacking the accessor.
    pub fn raised(&self) -> bool {
        matches!(self.cause, DeviceError::Raised(_))
    }
}

impl core::fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", self.accessor, self.cause)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Two scalar accessors: current, then max.
    Pair { current: Accessor, max: Accessor },
    /// `tank()` → `{amount, capacity}`.
    Tank,
    /// `getTankInfo(side)` → `[{amount, capacity}, ..]`, first record used.
    TankInfo { side: u32 },
}

/// Probe order. Earlier entries win.
pub const STRATEGIES: [Strategy; 6] = [
    Strategy::Pair {
        current: Accessor::GetEuStored,
        max: Accessor::GetEuCapacity,
    },
    Strategy::Pair {
        current: Accessor::GetStoredEu,
        max: Accessor::GetCapacityEu,
    },
    Strategy::Pair {
        current: Accessor::GetEnergyStored,
        max: Accessor::GetMaxEnergyStored,
    },
    Strategy::Pair {
        current: Accessor::GetStored,
        max: Accessor::GetCapacity,
    },
    Strategy::Tank,
    Strategy::TankInfo { side: 1 },
];

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pair { current, .. } => current.name(),
            Self::Tank => "tank",
            Self::TankInfo { .. } => "getTankInfo",
        }
    }

    /// Try this strategy against `device`. Never panics on device failure.
    pub fn probe<D: EnergyDevice + ?Sized>(
        &self,
        device: &mut D,
    ) -> Result<(f64, f64), ProbeFailure> {
        match *self {
            Self::Pair { current, max } => {
                let c = scalar(device, current)?;
                let m = scalar(device, max)?;
                Ok((c, m))
            }
            Self::Tank => {
                let level = device
                    .tank()
                    .map_err(|e| ProbeFailure::new("tank", e))?;
                level_pair(level, "tank.amount", "tank.capacity")
            }
            Self::TankInfo { side } => {
                let records = device
                    .tank_info(side)
                    .map_err(|e| ProbeFailure::new("getTankInfo", e))?;
                let first = records
                    .first()
                    .copied()
                    .ok_or_else(|| ProbeFailure::new("getTankInfo", DeviceError::Null))?;
                level_pair(first, "getTankInfo.amount", "getTankInfo.capacity")
            }
        }
    }
}

fn scalar<D: EnergyDevice + ?Sized>(
    device: &mut D,
    accessor: Accessor,
) -> Result<f64, ProbeFailure> {
    let value = device
        .scalar(accessor)
        .map_err(|e| ProbeFailure::new(accessor.name(), e))?;
    finite(value, accessor.name())
}

fn level_pair(
    level: TankLevel,
    amount_name: &'static str,
    capacity_name: &'static str,
) -> Result<(f64, f64), ProbeFailure> {
    let amount = level
        .amount
        .ok_or_else(|| ProbeFailure::new(amount_name, DeviceError::Null))?;
    let capacity = level
        .capacity
        .ok_or_else(|| ProbeFailure::new(capacity_name, DeviceError::Null))?;
    Ok((finite(amount, amount_name)?, finite(capacity, capacity_name)?))
}

/// NaN and infinities are not usable numbers.
fn finite(value: f64, name: &'static str) -> Result<f64, ProbeFailure> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ProbeFailure::new(name, DeviceError::Null))
    }
}
