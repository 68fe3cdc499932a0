//! Control loop: the hexagonal core.
//!
//! [`ControlLoop`] owns every piece of mutable state in the pipeline: the
//! reading history, the rate FIFO, and the controller. It is driven from a
//! single thread; one tick runs to completion before the next begins, so
//! nothing here needs a lock.
//!
//! ```text
//!  EnergyDevice ──▶ ┌─────────────────────────────┐ ──▶ EventSink
//!                   │        ControlLoop           │
//!   OutputPort  ◀── │ Reader · History · Rate · Hys│
//!                   └─────────────────────────────┘
//! ```
//!
//! The only suspension point is the end-of-tick wait, which is also the
//! only place cancellation is observed. Device calls block without a
//! timeout: a hung device stalls the loop.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use log::{error, info, warn};

use crate::config::MonitorConfig;
use crate::control::hysteresis::{Command, HysteresisController};
use crate::diagnostics::LoopMetrics;
use crate::drivers::actuator::ActuatorDriver;
use crate::history::{EMERGENCY_TRIM_LEN, HistoryBuffer, Reading};
use crate::rate::RateEstimator;
use crate::safety::{ShutdownReason, fail_safe_off};
use crate::sensors::SensorReader;

use super::events::{MonitorEvent, TelemetryData};
use super::ports::{Clock, EnergyDevice, EventSink, OutputPort};

/// Maintenance runs every this many ticks.
pub const GC_INTERVAL: u64 = 10;

pub struct ControlLoop<S, A, C> {
    sensor: Option<S>,
    actuator: ActuatorDriver<A>,
    clock: C,
    reader: SensorReader,
    history: HistoryBuffer,
    rate: RateEstimator,
    controller: HysteresisController,
    tick_interval: Duration,
    tick_limit: Option<u64>,
    metrics: LoopMetrics,
    /// The startup `Off` has not gone through yet.
    off_pending: bool,
    memory_pressure: bool,
    last_telemetry: Option<TelemetryData>,
}

impl<S: EnergyDevice, A: OutputPort, C: Clock> ControlLoop<S, A, C> {
    /// `config` is expected to have passed [`MonitorConfig::validate`].
    pub fn new(config: &MonitorConfig, sensor: Option<S>, actuator: Option<A>, clock: C) -> Self {
        Self {
            sensor,
            actuator: ActuatorDriver::new(actuator),
            clock,
            reader: SensorReader::new(),
            history: HistoryBuffer::new(config.history_duration_secs, config.max_history_size),
            rate: RateEstimator::new(
                config.rate_history_size,
                config.target_rate_window_secs,
                config.min_elapsed_gate_secs,
            ),
            controller: HysteresisController::new(config.low_threshold, config.high_threshold),
            tick_interval: config.check_interval(),
            tick_limit: None,
            metrics: LoopMetrics::default(),
            off_pending: false,
            memory_pressure: false,
            last_telemetry: None,
        }
    }

    /// Stop `run` after this many ticks (in addition to cancellation).
    pub fn set_tick_limit(&mut self, limit: Option<u64>) {
        self.tick_limit = limit;
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Reset the controller and issue the explicit startup `Off`.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.controller.reset();
        match self.actuator.apply(Command::Off) {
            Ok(()) => self.off_pending = false,
            Err(e) => {
                warn!("Startup Off failed ({}), retrying on later ticks", e);
                self.off_pending = true;
                self.metrics.actuator_faults += 1;
                sink.emit(&MonitorEvent::ActuatorFault(e));
            }
        }
        info!("ControlLoop started, tick every {:?}", self.tick_interval);
        sink.emit(&MonitorEvent::Started);
    }

    /// Run until cancelled, then shut down fail-safe.
    ///
    /// A message on `shutdown`, or every sender being dropped, cancels the
    /// loop at the end of the current tick. A fatal error or a panic inside
    /// the loop also runs the fail-safe `Off` before being passed on.
    pub fn run(
        &mut self,
        shutdown: &Receiver<()>,
        sink: &mut impl EventSink,
    ) -> anyhow::Result<()> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.run_until_cancelled(shutdown, &mut *sink)
        }));
        match outcome {
            Ok(Ok(())) => {
                self.stop(ShutdownReason::Cancelled, sink);
                Ok(())
            }
            Ok(Err(e)) => {
                error!("ControlLoop fatal: {}", e);
                self.stop(ShutdownReason::Fatal, sink);
                Err(anyhow::Error::new(e).context("control loop aborted"))
            }
            Err(payload) => {
                error!("ControlLoop panicked");
                self.stop(ShutdownReason::Panic, sink);
                panic::resume_unwind(payload)
            }
        }
    }

    fn run_until_cancelled(
        &mut self,
        shutdown: &Receiver<()>,
        sink: &mut impl EventSink,
    ) -> crate::error::Result<()> {
        self.start(sink);
        loop {
            let tick_started = Instant::now();
            self.tick(sink)?;

            if self
                .tick_limit
                .is_some_and(|limit| self.metrics.ticks >= limit)
            {
                info!("Tick limit reached");
                return Ok(());
            }

            let remaining = self.tick_interval.saturating_sub(tick_started.elapsed());
            match shutdown.recv_timeout(remaining) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    info!("Cancellation received");
                    return Ok(());
                }
            }
        }
    }

    /// Single fail-safe `Off`, controller reset, `Stopped` event.
    pub fn stop(&mut self, reason: ShutdownReason, sink: &mut impl EventSink) {
        fail_safe_off(&mut self.actuator, &mut self.controller, reason);
        sink.emit(&MonitorEvent::Stopped(reason));
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one cycle: read → history → control → rate → maintenance.
    ///
    /// Sensor and actuator problems are handled here. Only a broken
    /// history ordering comes back as `Err`.
    pub fn tick(&mut self, sink: &mut impl EventSink) -> crate::error::Result<()> {
        self.metrics.ticks += 1;
        let tick = self.metrics.ticks;

        // 1. Read
        let reading = self.reader.read(self.sensor.as_mut());

        if let Some(err) = reading.kind.error() {
            self.metrics.sensor_faults += 1;
            warn!("Tick {}: {}, control skipped", tick, err);
            sink.emit(&MonitorEvent::SensorFault(err));
        } else {
            // 2. History
            self.history.append(Reading {
                timestamp: self.clock.now_secs(),
                current_energy: reading.current_energy,
                max_energy: reading.max_energy,
            })?;

            // 3. Control (raw percent only)
            self.control(reading.percent, sink);

            // 4. Rate, for reporting
            let rate = self.rate.update(&self.history);
            let telemetry = TelemetryData {
                tick,
                percent: reading.percent,
                current_energy: reading.current_energy,
                max_energy: reading.max_energy,
                rate: rate.rate,
                rate_status: rate.status,
                active: self.controller.is_active(),
                history_len: self.history.len(),
            };
            self.last_telemetry = Some(telemetry);
            sink.emit(&MonitorEvent::Telemetry(telemetry));
        }

        // 5. Maintenance
        if tick % GC_INTERVAL == 0 {
            self.maintain(sink);
        }
        Ok(())
    }

    fn control(&mut self, percent: f64, sink: &mut impl EventSink) {
        let command = match self.controller.evaluate(percent) {
            Some(command) => command,
            None if self.off_pending => Command::Off,
            None => return,
        };

        match self.actuator.apply(command) {
            Ok(()) => {
                self.off_pending = false;
                let was_active = self.controller.is_active();
                self.controller.commit(command);
                let active = self.controller.is_active();
                if active != was_active {
                    info!(
                        "Output {} at {:.1}%",
                        if active { "ON" } else { "OFF" },
                        percent * 100.0
                    );
                    sink.emit(&MonitorEvent::ControlChanged { active });
                }
            }
            Err(e) => {
                // State left as-is so the same command is re-issued next tick.
                self.metrics.actuator_faults += 1;
                warn!("Apply {:?} failed: {}", command, e);
                sink.emit(&MonitorEvent::ActuatorFault(e));
            }
        }
    }

    fn maintain(&mut self, sink: &mut impl EventSink) {
        self.history.enforce_bounds();
        if self.memory_pressure {
            self.memory_pressure = false;
            let dropped = self.history.emergency_trim(EMERGENCY_TRIM_LEN);
            self.metrics.emergency_trims += 1;
            warn!("Memory pressure: history trimmed by {} entries", dropped);
            sink.emit(&MonitorEvent::EmergencyTrim { dropped });
        }
    }

    /// Request an emergency history trim at the next maintenance pass.
    pub fn flag_memory_pressure(&mut self) {
        self.memory_pressure = true;
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn is_active(&self) -> bool {
        self.controller.is_active()
    }

    pub fn metrics(&self) -> LoopMetrics {
        self.metrics
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn last_telemetry(&self) -> Option<&TelemetryData> {
        self.last_telemetry.as_ref()
    }

    /// Candidate accessor names from the last unrecognized device.
    pub fn sensor_candidates(&self) -> &[String] {
        self.reader.candidates()
    }

    pub fn sensor_mut(&mut self) -> Option<&mut S> {
        self.sensor.as_mut()
    }

    pub fn output(&self) -> Option<&A> {
        self.actuator.port()
    }

    pub fn output_mut(&mut self) -> Option<&mut A> {
        self.actuator.port_mut()
    }
}
