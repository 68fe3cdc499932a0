//! Sensor subsystem: adaptive probing of the energy store.
//!
//! The [`SensorReader`] walks [`STRATEGIES`](strategy::STRATEGIES) in
//! priority order and accepts the first one whose accessors all succeed.
//! Individual accessor failures only skip that strategy; a single flaky
//! accessor must not fail the read.

pub mod strategy;

use log::{debug, info, warn};

use crate::app::ports::EnergyDevice;
use crate::diagnostics::candidate_accessors;
use crate::error::SensorError;
use strategy::STRATEGIES;

/// Classification of one read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingKind {
    Ok,
    SensorUnavailable,
    NoRecognizedMethod,
    ZeroCapacity,
}

impl ReadingKind {
    /// The error this kind represents, if any.
    pub fn error(self) -> Option<SensorError> {
        match self {
            Self::Ok => None,
            Self::SensorUnavailable => Some(SensorError::SensorUnavailable),
            Self::NoRecognizedMethod => Some(SensorError::NoRecognizedMethod),
            Self::ZeroCapacity => Some(SensorError::ZeroCapacity),
        }
    }
}

/// Result of [`SensorReader::read`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    /// Charge fraction 0..1 when `kind` is `Ok`, otherwise 0.
    pub percent: f64,
    pub kind: ReadingKind,
    pub current_energy: f64,
    pub max_energy: f64,
    /// Name of the strategy that produced the values.
    pub strategy: Option<&'static str>,
}

impl SensorReading {
    fn failed(kind: ReadingKind) -> Self {
        Self {
            percent: 0.0,
            kind,
            current_energy: 0.0,
            max_energy: 0.0,
            strategy: None,
        }
    }
}

#[derive(Default)]
pub struct SensorReader {
    /// Accessor names that look energy-related, captured on the most recent
    /// `NoRecognizedMethod` read.
    candidates: Vec<String>,
    /// Strategy that last succeeded; logged only when it changes.
    last_strategy: Option<&'static str>,
}

impl SensorReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read<D: EnergyDevice + ?Sized>(&mut self, device: Option<&mut D>) -> SensorReading {
        let Some(device) = device else {
            return SensorReading::failed(ReadingKind::SensorUnavailable);
        };

        for strategy in &STRATEGIES {
            match strategy.probe(&mut *device) {
                Ok((current, max)) => {
                    if self.last_strategy != Some(strategy.name()) {
                        info!("Sensor: using strategy {}", strategy.name());
                        self.last_strategy = Some(strategy.name());
                    }
                    if max == 0.0 {
                        return SensorReading {
                            strategy: Some(strategy.name()),
                            ..SensorReading::failed(ReadingKind::ZeroCapacity)
                        };
                    }
                    return SensorReading {
                        percent: current / max,
                        kind: ReadingKind::Ok,
                        current_energy: current,
                        max_energy: max,
                        strategy: Some(strategy.name()),
                    };
                }
                Err(failure) if failure.raised() => {
                    debug!("Sensor: strategy {} skipped ({})", strategy.name(), failure);
                }
                Err(_) => {}
            }
        }

        self.last_strategy = None;
        self.candidates = candidate_accessors(&device.method_names());
        if !self.candidates.is_empty() {
            warn!(
                "Sensor: no recognized method; candidates: {}",
                self.candidates.join(", ")
            );
        }
        SensorReading::failed(ReadingKind::NoRecognizedMethod)
    }

    /// Candidate accessor names from the last failed probe.
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }
}
