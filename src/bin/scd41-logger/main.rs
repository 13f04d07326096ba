// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

mod args;
mod lock;
mod logging;
mod signal;

use std::fs::OpenOptions;
use std::io::LineWriter;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context as _, Result, bail};
use args::{Args, Command, RunArgs};
use chrono::{Local, TimeDelta};
use clap::Parser as _;
use i2cdev::linux::LinuxI2CDevice;
use log::{error, info, warn};
use scd41_i2c::{
    ContinuousMeasurement, Measurement, Scd41, SessionConfig, SessionState,
    db::{PgStore, new_pool},
    decode::SensorVariant,
    schedule::next_start,
    transport::ThreadDelay,
};
use tokio::runtime::Runtime;

use crate::lock::{LockFile, remove_lock};

type Sensor = Scd41<LinuxI2CDevice, ThreadDelay>;

fn main() -> ExitCode {
    if let Err(e) = run() {
        error!("{e:#}");
        eprintln!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::from(0)
}

fn run() -> Result<()> {
    let args = Args::parse();

    let log_path = logging::init(&args.log_dir).context("failed to set up logging")?;
    info!(
        "scd41-logger {} started, logging to {}",
        env!("CARGO_PKG_VERSION"),
        log_path.display()
    );

    let runtime = Runtime::new().context("failed to start tokio runtime")?;
    let state = Arc::new(SessionState::new());

    // Dropped on every return path; the observer exits the process without
    // unwinding, so it removes the file by path instead.
    let lock = LockFile::acquire(&args.lock_file).context("failed to acquire lock")?;
    let lock_path = lock.path().to_path_buf();
    signal::spawn_observer(runtime.handle().clone(), Arc::clone(&state), move || {
        remove_lock(&lock_path)
    })
    .context("failed to start shutdown observer")?;

    match args.command {
        Command::Run(run_args) => {
            run_sessions(&runtime, &state, &args.i2c_bus, args.address, run_args)
        }
        Command::Calibrate { target } => calibrate(&state, &args.i2c_bus, args.address, target),
        Command::SingleShot { device } => single_shot(&state, &args.i2c_bus, args.address, device),
    }
}

fn run_sessions(
    runtime: &Runtime,
    state: &SessionState,
    bus: &str,
    address: u16,
    args: RunArgs,
) -> Result<()> {
    let pool = runtime
        .block_on(new_pool(&args.database_url))
        .context("failed to open measurement store")?;
    let store = PgStore::new(pool, runtime.handle().clone());

    let fallback = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&args.fallback_file)
        .with_context(|| format!("failed to open fallback file {:?}", args.fallback_file))?;

    let startup = state.run_exclusive(|| -> Result<Sensor> {
        let mut sensor = open_sensor(bus, address)?;
        check_sensor(&mut sensor)?;
        Ok(sensor)
    });
    let Some(mut sensor) = startup.transpose()? else {
        info!("shutdown requested before the sensor was checked");
        return Ok(());
    };

    let mut controller = ContinuousMeasurement::new(store, LineWriter::new(fallback));
    let config = SessionConfig::new(args.device, Duration::from_secs(args.term_seconds))
        .only_last(!args.every_reading);
    let interval = TimeDelta::minutes(args.interval_minutes);
    let lead = TimeDelta::seconds(args.lead_seconds);

    while !state.is_shutdown_requested() {
        let now = Local::now();
        let start = next_start(&now, interval, lead);
        info!("next session at {}", start.format("%Y-%m-%d %H:%M:%S"));
        if let Ok(wait) = (start - now).to_std() {
            thread::sleep(wait);
        }

        if let Err(e) = controller.run(&mut sensor, state, &config) {
            error!("continuous measurement failed: {e}");
        }
    }

    Ok(())
}

fn open_sensor(bus: &str, address: u16) -> Result<Sensor> {
    let mut sensor = Scd41::open(bus, address)
        .with_context(|| format!("failed to open {bus} at 0x{address:02x}"))?;
    info!("opened {bus} at 0x{address:02x}");

    // A previous run may have left the sensor measuring, which blocks every other command.
    if let Err(e) = sensor.stop_periodic_measurement() {
        warn!("stop_periodic_measurement() at startup: {e}");
    }

    Ok(sensor)
}

fn check_sensor(sensor: &mut Sensor) -> Result<()> {
    let variant = sensor
        .get_sensor_variant()
        .context("get_sensor_variant() failed")?;
    info!("sensor variant: {variant:?}");
    if let SensorVariant::Unknown(word) = variant {
        bail!("unexpected sensor variant 0x{word:04x}");
    }

    sensor
        .perform_self_test()
        .context("perform_self_test() failed")?;
    info!("perform_self_test(): PASS");

    Ok(())
}

fn calibrate(state: &SessionState, bus: &str, address: u16, target: u16) -> Result<()> {
    let calibrated = state.run_exclusive(|| -> Result<i32> {
        let mut sensor = open_sensor(bus, address)?;
        info!("forced recalibration to {target} ppm");
        sensor
            .perform_forced_recalibration(target)
            .context("perform_forced_recalibration() failed")
    });
    let Some(correction) = calibrated.transpose()? else {
        info!("shutdown requested, recalibration skipped");
        return Ok(());
    };
    info!("forced recalibration correction: {correction} ppm");

    Ok(())
}

fn single_shot(state: &SessionState, bus: &str, address: u16, device: i32) -> Result<()> {
    let measured = state.run_exclusive(|| -> Result<Measurement> {
        let mut sensor = open_sensor(bus, address)?;
        sensor
            .measure_single_shot()
            .context("measure_single_shot() failed")?;
        sensor
            .read_measurement(device)
            .context("read_measurement() failed")
    });
    let Some(measurement) = measured.transpose()? else {
        info!("shutdown requested, single-shot measurement skipped");
        return Ok(());
    };
    print!("{}", measurement.fallback_record());

    Ok(())
}
