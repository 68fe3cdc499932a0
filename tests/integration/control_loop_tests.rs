//! Integration tests for the ControlLoop → controller → output bank pipeline.
//!
//! Everything runs on the host against the mocks in `mock_hw`. Ticks are
//! driven by hand except where `run` itself is under test; those cases
//! cancel or stop before the first inter-tick wait so no test sleeps.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;

use energymon::adapters::sim::{Shape, SimParams, simulated_pair};
use energymon::app::control_loop::ControlLoop;
use energymon::app::events::MonitorEvent;
use energymon::config::MonitorConfig;
use energymon::error::{ActuatorError, SensorError};
use energymon::rate::RateStatus;
use energymon::safety::ShutdownReason;

use super::mock_hw::{ManualClock, MockBank, MockStore, RecordingSink};

type Loop = ControlLoop<MockStore, MockBank, ManualClock>;

fn make_loop(fraction: f64, bank: MockBank) -> (Loop, RecordingSink) {
    let (clock, _) = ManualClock::stepping(1.0);
    let mut control = ControlLoop::new(
        &MonitorConfig::default(),
        Some(MockStore::at(fraction)),
        Some(bank),
        clock,
    );
    let mut sink = RecordingSink::default();
    control.start(&mut sink);
    (control, sink)
}

fn tick_at(control: &mut Loop, sink: &mut RecordingSink, fraction: f64) {
    control.sensor_mut().unwrap().set_fraction(fraction);
    control.tick(sink).unwrap();
}

fn bank(control: &Loop) -> &MockBank {
    control.output().unwrap()
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn startup_forces_every_channel_off() {
    let (control, sink) = make_loop(0.5, MockBank::default());
    assert_eq!(
        bank(&control).writes,
        vec![(0, 0), (1, 0), (2, 0), (3, 0), (4, 0), (5, 0)]
    );
    assert_eq!(sink.events, vec![MonitorEvent::Started]);
    assert!(!control.is_active());
}

#[test]
fn failed_startup_off_is_retried_on_next_tick() {
    let (mut control, mut sink) = make_loop(
        0.5,
        MockBank {
            dead: true,
            ..MockBank::default()
        },
    );
    assert_eq!(
        sink.count(|e| matches!(e, MonitorEvent::ActuatorFault(_))),
        1
    );

    control.output_mut().unwrap().dead = false;
    let before = bank(&control).writes.len();
    // 50% is inside the band: no command of its own, only the pending Off.
    tick_at(&mut control, &mut sink, 0.5);
    assert_eq!(bank(&control).writes.len(), before + 6);
    assert!(bank(&control).last_sweep_is(0));

    let before = bank(&control).writes.len();
    tick_at(&mut control, &mut sink, 0.5);
    assert_eq!(bank(&control).writes.len(), before, "Off already delivered");
}

// ── Hysteresis through the loop ───────────────────────────────

#[test]
fn hysteresis_sequence_drives_outputs() {
    let (mut control, mut sink) = make_loop(0.5, MockBank::default());

    let expected = [(0.5, false), (0.2, true), (0.5, true), (0.9, false), (0.5, false)];
    for (fraction, active) in expected {
        tick_at(&mut control, &mut sink, fraction);
        assert_eq!(control.is_active(), active, "at {fraction}");
    }

    // Startup sweep, On sweep, Off sweep.
    let writes = &bank(&control).writes;
    assert_eq!(writes.len(), 18);
    assert!(writes[6..12].iter().all(|&(_, level)| level == 15));
    assert!(bank(&control).last_sweep_is(0));

    let changes: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            MonitorEvent::ControlChanged { active } => Some(*active),
            _ => None,
        })
        .collect();
    assert_eq!(changes, vec![true, false]);
}

#[test]
fn broken_channel_keeps_retrying_until_it_recovers() {
    let (mut control, mut sink) = make_loop(0.5, MockBank::broken(3));
    // Startup Off already failed on channel 3.

    tick_at(&mut control, &mut sink, 0.1);
    assert!(!control.is_active(), "failed On must not be committed");
    tick_at(&mut control, &mut sink, 0.1);
    assert!(!control.is_active());

    let on_writes = bank(&control).writes.iter().filter(|w| w.1 == 15).count();
    assert_eq!(on_writes, 12, "every channel attempted on both ticks");
    assert_eq!(control.metrics().actuator_faults, 3);
    assert!(sink.events.contains(&MonitorEvent::ActuatorFault(
        ActuatorError::ActuatorWriteFailed {
            channel: 3,
            failed: 1
        }
    )));

    control.output_mut().unwrap().broken_channel = None;
    tick_at(&mut control, &mut sink, 0.1);
    assert!(control.is_active());
    assert!(bank(&control).last_sweep_is(15));
    assert_eq!(
        sink.events.last(),
        Some(&MonitorEvent::Telemetry(*control.last_telemetry().unwrap()))
    );
}

// ── Sensor faults ─────────────────────────────────────────────

#[test]
fn sensor_fault_skips_history_and_control() {
    let (mut control, mut sink) = make_loop(0.1, MockBank::default());
    control.sensor_mut().unwrap().broken = true;
    control.tick(&mut sink).unwrap();

    assert!(control.history().is_empty());
    assert!(!control.is_active());
    assert_eq!(bank(&control).writes.len(), 6, "startup sweep only");
    assert_eq!(control.metrics().sensor_faults, 1);
    assert!(
        sink.events
            .contains(&MonitorEvent::SensorFault(SensorError::NoRecognizedMethod))
    );
}

#[test]
fn missing_sensor_is_reported_every_tick() {
    let (clock, _) = ManualClock::stepping(1.0);
    let mut control: Loop =
        ControlLoop::new(&MonitorConfig::default(), None, Some(MockBank::default()), clock);
    let mut sink = RecordingSink::default();
    control.start(&mut sink);
    control.tick(&mut sink).unwrap();
    control.tick(&mut sink).unwrap();
    assert_eq!(
        sink.count(|e| *e == MonitorEvent::SensorFault(SensorError::SensorUnavailable)),
        2
    );
}

#[test]
fn unrecognized_store_exposes_candidates() {
    let (store, _) = simulated_pair(Shape::Unrecognized, SimParams::default());
    let (clock, _) = ManualClock::stepping(1.0);
    let mut control = ControlLoop::new(
        &MonitorConfig::default(),
        Some(store),
        Some(MockBank::default()),
        clock,
    );
    let mut sink = RecordingSink::default();
    control.start(&mut sink);
    control.tick(&mut sink).unwrap();

    assert_eq!(
        control.sensor_candidates(),
        ["getEnergyLevel", "getMaxEnergyLevel"]
    );
}

// ── Telemetry and rate ────────────────────────────────────────

#[test]
fn telemetry_carries_smoothed_rate() {
    let (mut control, mut sink) = make_loop(0.5, MockBank::default());

    control.tick(&mut sink).unwrap();
    let first = *control.last_telemetry().unwrap();
    assert_eq!(first.rate_status, RateStatus::InsufficientData);
    assert_eq!(first.history_len, 1);

    for i in 1..5 {
        control.sensor_mut().unwrap().energy = 500.0 - 10.0 * f64::from(i);
        control.tick(&mut sink).unwrap();
    }
    let t = control.last_telemetry().unwrap();
    assert_eq!(t.rate_status, RateStatus::Ok);
    assert!((t.rate - -10.0).abs() < f64::EPSILON, "rate {}", t.rate);
    assert_eq!(t.tick, 5);
    assert_eq!(t.history_len, 5);
    assert!((t.percent - 0.46).abs() < 1e-9);
}

// ── Maintenance ───────────────────────────────────────────────

#[test]
fn memory_pressure_trims_at_next_maintenance_pass() {
    let (mut control, mut sink) = make_loop(0.5, MockBank::default());
    for _ in 0..15 {
        control.tick(&mut sink).unwrap();
    }
    control.flag_memory_pressure();
    for _ in 0..4 {
        control.tick(&mut sink).unwrap();
    }
    assert_eq!(control.history().len(), 19, "not before the pass");

    control.tick(&mut sink).unwrap();
    assert_eq!(control.history().len(), 10);
    assert_eq!(control.metrics().emergency_trims, 1);
    assert!(sink.events.contains(&MonitorEvent::EmergencyTrim { dropped: 10 }));
}

// ── Shutdown paths ────────────────────────────────────────────

#[test]
fn cancellation_turns_outputs_off() {
    let (mut control, mut sink) = make_loop(0.1, MockBank::default());
    let (tx, rx) = mpsc::channel();
    tx.send(()).unwrap();

    control.run(&rx, &mut sink).unwrap();

    assert_eq!(control.metrics().ticks, 1);
    assert!(!control.is_active());
    assert!(bank(&control).last_sweep_is(0));
    assert!(sink.events.contains(&MonitorEvent::ControlChanged { active: true }));
    assert_eq!(
        sink.events.last(),
        Some(&MonitorEvent::Stopped(ShutdownReason::Cancelled))
    );
}

#[test]
fn dropped_sender_counts_as_cancellation() {
    let (mut control, mut sink) = make_loop(0.5, MockBank::default());
    let (tx, rx) = mpsc::channel::<()>();
    drop(tx);

    control.run(&rx, &mut sink).unwrap();
    assert_eq!(
        sink.events.last(),
        Some(&MonitorEvent::Stopped(ShutdownReason::Cancelled))
    );
}

#[test]
fn tick_limit_stops_without_waiting() {
    let (mut control, mut sink) = make_loop(0.1, MockBank::default());
    control.set_tick_limit(Some(1));
    let (_tx, rx) = mpsc::channel::<()>();

    control.run(&rx, &mut sink).unwrap();
    assert_eq!(control.metrics().ticks, 1);
    assert!(bank(&control).last_sweep_is(0));
}

#[test]
fn clock_going_backwards_is_fatal_and_fail_safe() {
    let (clock, _) = ManualClock::stepping(-1.0);
    let mut control = ControlLoop::new(
        &MonitorConfig::default(),
        Some(MockStore::at(0.1)),
        Some(MockBank::default()),
        clock,
    );
    let mut sink = RecordingSink::default();
    control.start(&mut sink);
    control.tick(&mut sink).unwrap();
    assert!(control.is_active());

    let (_tx, rx) = mpsc::channel::<()>();
    let err = control.run(&rx, &mut sink).unwrap_err();

    assert!(err.to_string().contains("control loop aborted"));
    assert!(!control.is_active());
    assert!(bank(&control).last_sweep_is(0));
    assert_eq!(
        sink.events.last(),
        Some(&MonitorEvent::Stopped(ShutdownReason::Fatal))
    );
}

#[test]
fn panic_in_device_still_turns_outputs_off() {
    let (mut control, mut sink) = make_loop(0.5, MockBank::default());
    control.sensor_mut().unwrap().explode = true;
    let (_tx, rx) = mpsc::channel::<()>();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| control.run(&rx, &mut sink)));
    assert!(outcome.is_err(), "panic must propagate");

    // make_loop start, run start, fail-safe.
    assert_eq!(bank(&control).writes.len(), 18);
    assert!(bank(&control).last_sweep_is(0));
    assert_eq!(
        sink.events.last(),
        Some(&MonitorEvent::Stopped(ShutdownReason::Panic))
    );
}
