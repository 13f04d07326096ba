// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::error::Error;
use std::fmt;
use std::io::Write;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::error::Scd41Error;
use crate::measurement::Measurement;
use crate::scd41::Scd41;
use crate::session::SessionState;
use crate::transport::{Delay, Transport};

/// Destination for decoded measurements.
pub trait MeasurementStore {
    type Error: fmt::Display;

    fn insert(&mut self, measurement: &Measurement) -> Result<(), Self::Error>;
}

/// Parameters of one continuous measurement session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Tag written with every measurement of the session.
    pub device: i32,
    /// Minimum time the poll/read cycle keeps going.
    pub term: Duration,
    /// Keep only the final reading instead of storing every one.
    pub only_last: bool,
}

impl SessionConfig {
    pub fn new(device: i32, term: Duration) -> SessionConfig {
        SessionConfig {
            device,
            term,
            only_last: true,
        }
    }

    pub fn only_last(mut self, only_last: bool) -> Self {
        self.only_last = only_last;
        self
    }
}

/// Failure of a session, tagged with the operation that failed.
#[derive(Debug)]
pub enum SessionError {
    Start(Scd41Error),
    DataReady(Scd41Error),
    Read(Scd41Error),
    Stop(Scd41Error),
}

impl SessionError {
    pub fn operation(&self) -> &'static str {
        match self {
            SessionError::Start(_) => "start_periodic_measurement",
            SessionError::DataReady(_) => "get_data_ready_status",
            SessionError::Read(_) => "read_measurement",
            SessionError::Stop(_) => "stop_periodic_measurement",
        }
    }

    pub fn cause(&self) -> &Scd41Error {
        match self {
            SessionError::Start(e)
            | SessionError::DataReady(e)
            | SessionError::Read(e)
            | SessionError::Stop(e) => e,
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}() failed: {}", self.operation(), self.cause())
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.cause())
    }
}

/// Runs bounded continuous-measurement sessions and hands the readings to
/// `store`, appending a text record to `fallback` whenever the store refuses one.
pub struct ContinuousMeasurement<S, W> {
    pub store: S,
    pub fallback: W,
}

impl<S: MeasurementStore, W: Write> ContinuousMeasurement<S, W> {
    pub fn new(store: S, fallback: W) -> Self {
        ContinuousMeasurement { store, fallback }
    }

    /// One session: start periodic measurement, poll and read until `term`
    /// has elapsed or shutdown is requested, then always stop.
    ///
    /// The first error wins; a stop failure is only returned when nothing
    /// failed before it. Returns without touching the sensor if shutdown was
    /// already requested.
    pub fn run<T: Transport, D: Delay>(
        &mut self,
        sensor: &mut Scd41<T, D>,
        state: &SessionState,
        config: &SessionConfig,
    ) -> Result<(), SessionError> {
        let Some(_measuring) = state.begin_measuring() else {
            info!("shutdown requested, session for device {} skipped", config.device);
            return Ok(());
        };
        info!(
            "session start: device={} term={:?} only_last={}",
            config.device, config.term, config.only_last
        );

        if let Err(e) = sensor.start_periodic_measurement() {
            error!("start_periodic_measurement(): {e}");
            // Unclear whether the sensor needs a stop here, send one anyway.
            if let Err(stop) = sensor.stop_periodic_measurement() {
                warn!("stop_periodic_measurement() after failed start: {stop}");
            }
            return Err(SessionError::Start(e));
        }

        // The final reading is stored even when the cycle ended on shutdown,
        // but not when a later transaction failed.
        let outcome = match self.cycle(sensor, state, config) {
            Ok(last) => {
                if config.only_last {
                    self.persist(&last);
                }
                Ok(())
            }
            Err(e) => Err(e),
        };

        let stopped = sensor.stop_periodic_measurement();
        info!("session end: device={}", config.device);
        match (outcome, stopped) {
            (Err(e), Err(stop)) => {
                error!("stop_periodic_measurement(): {stop}");
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(()), Err(stop)) => Err(SessionError::Stop(stop)),
            (Ok(()), Ok(())) => Ok(()),
        }
    }

    fn cycle<T: Transport, D: Delay>(
        &mut self,
        sensor: &mut Scd41<T, D>,
        state: &SessionState,
        config: &SessionConfig,
    ) -> Result<Measurement, SessionError> {
        let started = Instant::now();
        loop {
            sensor.wait_data_ready().map_err(SessionError::DataReady)?;
            let measurement = sensor
                .read_measurement(config.device)
                .map_err(SessionError::Read)?;
            debug!(
                "co2={}ppm t={:.2}C rh={:.1}%",
                measurement.co2_ppm, measurement.temperature_celsius, measurement.humidity_percent
            );

            if !config.only_last {
                self.persist(&measurement);
            }
            if started.elapsed() >= config.term || state.is_shutdown_requested() {
                return Ok(measurement);
            }
        }
    }

    fn persist(&mut self, measurement: &Measurement) {
        let Err(e) = self.store.insert(measurement) else {
            return;
        };
        warn!("insert failed, writing fallback record: {e}");
        let record = measurement.fallback_record();
        let written = write!(self.fallback, "{record}").and_then(|_| self.fallback.flush());
        if let Err(e) = written {
            error!("fallback write failed: {e}: {}", record.to_string().trim_end());
        }
    }
}
