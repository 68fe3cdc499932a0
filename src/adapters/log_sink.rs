//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing monitor events to the `log` facade.
//! A graphical or remote presentation layer would implement the same trait.

use log::{info, warn};

use crate::app::events::MonitorEvent;
use crate::app::ports::EventSink;
use crate::rate::RateStatus;

/// Adapter that logs every [`MonitorEvent`] as a single line.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &MonitorEvent) {
        match event {
            MonitorEvent::Telemetry(t) => {
                let rate = match t.rate_status {
                    RateStatus::Ok => format!("{:+.0} EU/s", t.rate),
                    RateStatus::InsufficientData | RateStatus::InsufficientTime => {
                        "-- EU/s".to_string()
                    }
                };
                info!(
                    "TELEM | #{} | {:.1}% ({:.0}/{:.0}) | {} | output={} | history={}",
                    t.tick,
                    t.percent * 100.0,
                    t.current_energy,
                    t.max_energy,
                    rate,
                    if t.active { "ON" } else { "OFF" },
                    t.history_len,
                );
            }
            MonitorEvent::ControlChanged { active } => {
                info!("CTRL  | output -> {}", if *active { "ON" } else { "OFF" });
            }
            MonitorEvent::SensorFault(e) => {
                warn!("FAULT | sensor: {}", e);
            }
            MonitorEvent::ActuatorFault(e) => {
                warn!("FAULT | actuator: {}", e);
            }
            MonitorEvent::EmergencyTrim { dropped } => {
                warn!("MAINT | emergency trim dropped {} readings", dropped);
            }
            MonitorEvent::Started => {
                info!("START | outputs forced off");
            }
            MonitorEvent::Stopped(reason) => {
                info!("STOP  | {}", reason);
            }
        }
    }
}
