//! Mock devices for integration tests.
//!
//! The store serves the RF accessor pair from plain fields the test can
//! change between ticks; the bank records every channel write.

use std::cell::Cell;
use std::rc::Rc;

use energymon::app::events::MonitorEvent;
use energymon::app::ports::{Clock, DeviceError, EnergyDevice, EventSink, OutputPort, TankLevel};
use energymon::sensors::strategy::Accessor;

// ── MockStore ─────────────────────────────────────────────────

pub struct MockStore {
    pub energy: f64,
    pub capacity: f64,
    /// Every accessor raises.
    pub broken: bool,
    /// Reading the store panics.
    pub explode: bool,
}

#[allow(dead_code)]
impl MockStore {
    pub fn at(fraction: f64) -> Self {
        Self {
            energy: fraction * 1000.0,
            capacity: 1000.0,
            broken: false,
            explode: false,
        }
    }

    pub fn set_fraction(&mut self, fraction: f64) {
        self.energy = fraction * self.capacity;
    }
}

impl EnergyDevice for MockStore {
    fn scalar(&mut self, accessor: Accessor) -> Result<f64, DeviceError> {
        assert!(!self.explode, "store exploded");
        if self.broken {
            return Err(DeviceError::Raised("peripheral detached".into()));
        }
        match accessor {
            Accessor::GetEnergyStored => Ok(self.energy),
            Accessor::GetMaxEnergyStored => Ok(self.capacity),
            _ => Err(DeviceError::Absent),
        }
    }

    fn tank(&mut self) -> Result<TankLevel, DeviceError> {
        Err(DeviceError::Absent)
    }

    fn tank_info(&mut self, _side: u32) -> Result<Vec<TankLevel>, DeviceError> {
        Err(DeviceError::Absent)
    }

    fn method_names(&self) -> Vec<String> {
        vec!["getEnergyStored".into(), "getMaxEnergyStored".into()]
    }
}

// ── MockBank ──────────────────────────────────────────────────

#[derive(Default)]
pub struct MockBank {
    pub writes: Vec<(u8, u8)>,
    /// Writes to this channel fail.
    pub broken_channel: Option<u8>,
    /// Every write fails.
    pub dead: bool,
}

#[allow(dead_code)]
impl MockBank {
    pub fn broken(channel: u8) -> Self {
        Self {
            broken_channel: Some(channel),
            ..Self::default()
        }
    }

    /// The last `n` writes, oldest first.
    pub fn tail(&self, n: usize) -> &[(u8, u8)] {
        &self.writes[self.writes.len().saturating_sub(n)..]
    }

    /// True when the last full sweep drove every channel to `level`.
    pub fn last_sweep_is(&self, level: u8) -> bool {
        self.writes.len() >= 6
            && self
                .tail(6)
                .iter()
                .enumerate()
                .all(|(i, &(ch, l))| ch as usize == i && l == level)
    }
}

impl OutputPort for MockBank {
    fn set_output(&mut self, channel: u8, level: u8) -> Result<(), DeviceError> {
        self.writes.push((channel, level));
        if self.dead || self.broken_channel == Some(channel) {
            return Err(DeviceError::Raised("no such side".into()));
        }
        Ok(())
    }
}

// ── ManualClock ───────────────────────────────────────────────

/// Returns the shared time, then moves it by `step`.
pub struct ManualClock {
    pub now: Rc<Cell<f64>>,
    pub step: f64,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn stepping(step: f64) -> (Self, Rc<Cell<f64>>) {
        let now = Rc::new(Cell::new(0.0));
        (
            Self {
                now: Rc::clone(&now),
                step,
            },
            now,
        )
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> f64 {
        let t = self.now.get();
        self.now.set(t + self.step);
        t
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<MonitorEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&MonitorEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &MonitorEvent) {
        self.events.push(event.clone());
    }
}
