//! Simulated energy store and output bank for host runs.
//!
//! The store drains at a constant load and charges while any output channel
//! is driven, so the hysteresis loop has something to regulate. Both halves
//! share one state cell; the loop is single-threaded.
//!
//! The store can impersonate any of the recognized accessor shapes, or none
//! of them, to exercise the probing and diagnostics paths.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use crate::app::ports::{DeviceError, EnergyDevice, OutputPort, TankLevel};
use crate::drivers::actuator::CHANNEL_COUNT;
use crate::sensors::strategy::Accessor;

/// Accessor shape the simulated store exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `getEUStored` / `getEUCapacity`
    Eu,
    /// `getStoredEU` / `getCapacityEU`
    StoredEu,
    /// `getEnergyStored` / `getMaxEnergyStored`
    Rf,
    /// `getStored` / `getCapacity`
    Generic,
    /// `tank()`
    Tank,
    /// `getTankInfo(side)`
    TankInfo,
    /// Nothing the reader knows about.
    Unrecognized,
}

#[derive(Debug, Clone, Copy)]
pub struct SimParams {
    pub capacity: f64,
    /// Starting charge fraction 0..1.
    pub initial_fraction: f64,
    /// Constant drain, EU/s.
    pub load: f64,
    /// Charge while the outputs are on, EU/s.
    pub generation: f64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            capacity: 1_000_000.0,
            initial_fraction: 0.5,
            load: 8_000.0,
            generation: 20_000.0,
        }
    }
}

struct SimState {
    params: SimParams,
    stored: f64,
    generator_on: bool,
    last_update: Instant,
}

impl SimState {
    fn advance(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_update).as_secs_f64();
        self.last_update = now;
        let gain = if self.generator_on {
            self.params.generation
        } else {
            0.0
        };
        self.stored =
            (self.stored + (gain - self.params.load) * dt).clamp(0.0, self.params.capacity);
    }
}

/// Build a store and an output bank wired to the same simulated state.
pub fn simulated_pair(shape: Shape, params: SimParams) -> (SimulatedStore, SimulatedOutputs) {
    let state = Rc::new(RefCell::new(SimState {
        params,
        stored: params.capacity * params.initial_fraction.clamp(0.0, 1.0),
        generator_on: false,
        last_update: Instant::now(),
    }));
    (
        SimulatedStore {
            shape,
            state: Rc::clone(&state),
        },
        SimulatedOutputs {
            state,
            levels: [0; CHANNEL_COUNT as usize],
        },
    )
}

pub struct SimulatedStore {
    shape: Shape,
    state: Rc<RefCell<SimState>>,
}

impl SimulatedStore {
    fn sample(&self) -> (f64, f64) {
        let mut state = self.state.borrow_mut();
        state.advance();
        (state.stored, state.params.capacity)
    }

    fn level(&self) -> TankLevel {
        let (stored, capacity) = self.sample();
        TankLevel {
            amount: Some(stored),
            capacity: Some(capacity),
        }
    }
}

impl EnergyDevice for SimulatedStore {
    fn scalar(&mut self, accessor: Accessor) -> Result<f64, DeviceError> {
        use Accessor::{
            GetCapacity, GetCapacityEu, GetEnergyStored, GetEuCapacity, GetEuStored,
            GetMaxEnergyStored, GetStored, GetStoredEu,
        };
        let (stored, capacity) = match (self.shape, accessor) {
            (Shape::Eu, GetEuStored | GetEuCapacity)
            | (Shape::StoredEu, GetStoredEu | GetCapacityEu)
            | (Shape::Rf, GetEnergyStored | GetMaxEnergyStored)
            | (Shape::Generic, GetStored | GetCapacity) => self.sample(),
            _ => return Err(DeviceError::Absent),
        };
        Ok(match accessor {
            GetEuStored | GetStoredEu | GetEnergyStored | GetStored => stored,
            GetEuCapacity | GetCapacityEu | GetMaxEnergyStored | GetCapacity => capacity,
        })
    }

    fn tank(&mut self) -> Result<TankLevel, DeviceError> {
        match self.shape {
            Shape::Tank => Ok(self.level()),
            _ => Err(DeviceError::Absent),
        }
    }

    fn tank_info(&mut self, _side: u32) -> Result<Vec<TankLevel>, DeviceError> {
        match self.shape {
            Shape::TankInfo => Ok(vec![self.level()]),
            _ => Err(DeviceError::Absent),
        }
    }

    fn method_names(&self) -> Vec<String> {
        let names: &[&str] = match self.shape {
            Shape::Eu => &["getEUStored", "getEUCapacity", "getTier"],
            Shape::StoredEu => &["getStoredEU", "getCapacityEU", "getOutputEU"],
            Shape::Rf => &["getEnergyStored", "getMaxEnergyStored"],
            Shape::Generic => &["getStored", "getCapacity", "getName"],
            Shape::Tank => &["tank", "getName"],
            Shape::TankInfo => &["getTankInfo"],
            Shape::Unrecognized => &["getEnergyLevel", "getMaxEnergyLevel", "getName", "isActive"],
        };
        names.iter().map(|n| (*n).to_string()).collect()
    }
}

pub struct SimulatedOutputs {
    state: Rc<RefCell<SimState>>,
    levels: [u8; CHANNEL_COUNT as usize],
}

impl SimulatedOutputs {
    pub fn levels(&self) -> &[u8] {
        &self.levels
    }
}

impl OutputPort for SimulatedOutputs {
    fn set_output(&mut self, channel: u8, level: u8) -> Result<(), DeviceError> {
        let slot = self
            .levels
            .get_mut(channel as usize)
            .ok_or_else(|| DeviceError::Raised(format!("no channel {channel}")))?;
        *slot = level.min(15);

        let mut state = self.state.borrow_mut();
        state.advance();
        state.generator_on = self.levels.iter().any(|&l| l > 0);
        Ok(())
    }
}
