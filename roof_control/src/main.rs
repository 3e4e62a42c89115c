//! # Roof Controller Daemon
//!
//! Drives the observatory roof through the four-relay I²C expander.
//!
//! # Usage
//!
//! ```bash
//! # Run against real hardware
//! roof_control --config /etc/roof_control/roof.toml
//!
//! # Run with the simulated board
//! roof_control -c roof.toml --simulate
//!
//! # Verbose logging
//! roof_control -c roof.toml -s -v
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use roof_common::controller::config::RoofControllerConfig;
use roof_common::hal::bus::{BusError, RegisterBus};
use roof_common::hal::consts::{DEFAULT_I2C_ADDRESS, DEFAULT_I2C_BUS_PATH};
use roof_control::RoofController;
use roof_hal::{RelayBoard, SimulatedBus};

/// Observatory roof motion controller
#[derive(Parser, Debug)]
#[command(name = "roof_control")]
#[command(version)]
#[command(about = "Observatory roof motion controller")]
#[command(long_about = None)]
struct Args {
    /// Path to the controller configuration file (roof.toml)
    #[arg(short, long, default_value = "/etc/roof_control/roof.toml")]
    config: PathBuf,

    /// Run against the simulated expander board instead of hardware
    #[arg(short = 's', long)]
    simulate: bool,

    /// I2C bus device path
    #[arg(short, long, default_value = DEFAULT_I2C_BUS_PATH)]
    bus: PathBuf,

    /// 7-bit I2C device address of the expander
    #[arg(short, long, default_value_t = DEFAULT_I2C_ADDRESS)]
    address: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("roof controller startup failed: {e}");
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    setup_tracing(&args);

    info!("roof controller v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = if args.config.exists() {
        RoofControllerConfig::load_from_path(&args.config)?
    } else {
        warn!(path = %args.config.display(), "configuration file not found; using defaults");
        RoofControllerConfig::default()
    };

    let bus: Arc<dyn RegisterBus> = if args.simulate {
        info!("simulation mode enabled");
        Arc::new(SimulatedBus::new())
    } else {
        open_hardware(&args.bus, args.address)?
    };
    let board = RelayBoard::new(bus);
    info!(transport = %board.describe(), "expander board attached");

    let controller = RoofController::new(board, config)?;
    controller.subscribe(|snap| {
        info!(
            status = %snap.status,
            reason = %snap.last_stop_reason,
            moving = snap.is_moving,
            at_speed = snap.is_at_speed,
            "roof status"
        );
    });
    controller.initialize()?;

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = running.clone();
    ctrlc::set_handler(move || {
        info!("received shutdown signal");
        handler_flag.store(false, Ordering::SeqCst);
    })?;

    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(200));
    }

    controller.dispose()?;
    info!("roof controller shutdown complete");
    Ok(())
}

#[cfg(target_os = "linux")]
fn open_hardware(path: &Path, address: u16) -> Result<Arc<dyn RegisterBus>, BusError> {
    Ok(Arc::new(roof_hal::LinuxI2cBus::open(path, address)?))
}

#[cfg(not(target_os = "linux"))]
fn open_hardware(path: &Path, _address: u16) -> Result<Arc<dyn RegisterBus>, BusError> {
    Err(BusError::Open {
        path: path.display().to_string(),
        reason: "physical I2C access requires Linux; use --simulate".into(),
    })
}

/// Setup tracing subscriber based on CLI arguments
fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
