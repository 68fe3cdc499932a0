//! Energy store monitor, host entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  SimulatedStore   SimulatedOutputs   JsonConfigFile          │
//! │  (EnergyDevice)   (OutputPort)       (ConfigPort)            │
//! │  MonotonicClock   LogEventSink                               │
//! │  (Clock)          (EventSink)                                │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────┐      │
//! │  │            ControlLoop (pure logic)                │      │
//! │  │  Reader · History · Rate · Hysteresis · Safety     │      │
//! │  └────────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::sync::mpsc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use tracing_subscriber::filter::LevelFilter;

use energymon::adapters::config_file::JsonConfigFile;
use energymon::adapters::log_sink::LogEventSink;
use energymon::adapters::sim::{Shape, SimParams, simulated_pair};
use energymon::adapters::time::MonotonicClock;
use energymon::app::control_loop::ControlLoop;
use energymon::app::ports::ConfigPort;
use energymon::diagnostics;

#[derive(Parser)]
#[command(name = "energymon")]
#[command(about = "Energy store monitor with hysteresis-controlled outputs", long_about = None)]
struct Cli {
    /// JSON configuration file; defaults apply when it does not exist
    #[arg(long, default_value = "energymon.json")]
    config: PathBuf,
    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Monitor a simulated store until Ctrl-C
    Run {
        /// Accessor shape the simulated store exposes
        #[arg(long, value_enum, default_value_t = SimShape::Eu)]
        shape: SimShape,
        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// Try every read strategy once and report what works
    Probe {
        #[arg(long, value_enum, default_value_t = SimShape::Eu)]
        shape: SimShape,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SimShape {
    Eu,
    Ic2,
    Rf,
    Generic,
    Tank,
    TankInfo,
    None,
}

impl From<SimShape> for Shape {
    fn from(shape: SimShape) -> Self {
        match shape {
            SimShape::Eu => Shape::Eu,
            SimShape::Ic2 => Shape::StoredEu,
            SimShape::Rf => Shape::Rf,
            SimShape::Generic => Shape::Generic,
            SimShape::Tank => Shape::Tank,
            SimShape::TankInfo => Shape::TankInfo,
            SimShape::None => Shape::Unrecognized,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        })
        .init();

    match cli.command {
        Commands::Run { shape, ticks } => run(&cli.config, shape.into(), ticks),
        Commands::Probe { shape } => {
            probe(shape.into());
            Ok(())
        }
    }
}

fn run(config_path: &Path, shape: Shape, ticks: Option<u64>) -> Result<()> {
    let config = JsonConfigFile::new(config_path)
        .load()
        .with_context(|| format!("loading {}", config_path.display()))?;
    info!(
        "energymon v{}: thresholds {:.0}%/{:.0}%, every {}s",
        env!("CARGO_PKG_VERSION"),
        config.low_threshold * 100.0,
        config.high_threshold * 100.0,
        config.check_interval_secs
    );

    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        if shutdown_tx.send(()).is_err() {
            warn!("Ctrl-C after loop exit");
        }
    })
    .context("installing Ctrl-C handler")?;

    let (store, outputs) = simulated_pair(shape, SimParams::default());
    let mut control = ControlLoop::new(&config, Some(store), Some(outputs), MonotonicClock::new());
    control.set_tick_limit(ticks);

    let mut sink = LogEventSink::new();
    let result = control.run(&shutdown_rx, &mut sink);

    let m = control.metrics();
    info!(
        "Ran {} ticks: {} sensor faults, {} actuator faults, {} emergency trims",
        m.ticks, m.sensor_faults, m.actuator_faults, m.emergency_trims
    );
    result
}

fn probe(shape: Shape) {
    let (mut store, _) = simulated_pair(shape, SimParams::default());
    let report = diagnostics::probe(&mut store);
    println!("Probe results:");
    print!("{report}");
    match report.selected() {
        Some(strategy) => println!("Selected: {strategy}"),
        None => println!("Selected: none (no recognized method)"),
    }
}
