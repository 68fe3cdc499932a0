//! Probe diagnostics and runtime counters.
//!
//! Nothing in here feeds control decisions. The probe report exists for an
//! operator staring at a device that "should" work: it lists which
//! strategies succeed, why the others fail, and which advertised method
//! names look like they might be energy accessors.

use crate::app::ports::EnergyDevice;
use crate::sensors::strategy::{ProbeFailure, STRATEGIES};

/// Lowercase fragments that make an accessor name worth listing.
const NAME_HINTS: [&str; 9] = [
    "energy", "eu", "stored", "capacity", "charge", "power", "tank", "fluid", "rf",
];

/// Filter advertised method names down to plausible energy accessors.
/// Order is preserved; no values are read.
pub fn candidate_accessors(names: &[String]) -> Vec<String> {
    names
        .iter()
        .filter(|name| {
            let lower = name.to_ascii_lowercase();
            NAME_HINTS.iter().any(|hint| lower.contains(hint))
        })
        .cloned()
        .collect()
}

#[derive(Debug, Clone)]
pub struct StrategyOutcome {
    pub strategy: &'static str,
    pub result: Result<(f64, f64), ProbeFailure>,
}

#[derive(Debug, Clone)]
pub struct ProbeReport {
    /// One entry per strategy, in priority order.
    pub outcomes: Vec<StrategyOutcome>,
    pub candidates: Vec<String>,
}

impl ProbeReport {
    pub fn working(&self) -> impl Iterator<Item = &StrategyOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_ok())
    }

    pub fn failing(&self) -> impl Iterator<Item = &StrategyOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    /// The strategy the reader would pick.
    pub fn selected(&self) -> Option<&'static str> {
        self.working().next().map(|o| o.strategy)
    }
}

impl core::fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for outcome in &self.outcomes {
            match &outcome.result {
                Ok((current, max)) => {
                    writeln!(f, "  OK    {:<16} {} / {}", outcome.strategy, current, max)?;
                }
                Err(failure) => writeln!(f, "  FAIL  {:<16} {}", outcome.strategy, failure)?,
            }
        }
        if !self.candidates.is_empty() {
            writeln!(f, "  candidates: {}", self.candidates.join(", "))?;
        }
        Ok(())
    }
}

/// Run every strategy against `device`, not stopping at the first success.
pub fn probe<D: EnergyDevice + ?Sized>(device: &mut D) -> ProbeReport {
    let outcomes = STRATEGIES
        .iter()
        .map(|s| StrategyOutcome {
            strategy: s.name(),
            result: s.probe(&mut *device),
        })
        .collect();
    ProbeReport {
        outcomes,
        candidates: candidate_accessors(&device.method_names()),
    }
}

/// Counters collected by the control loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopMetrics {
    pub ticks: u64,
    pub sensor_faults: u64,
    pub actuator_faults: u64,
    pub emergency_trims: u32,
}
