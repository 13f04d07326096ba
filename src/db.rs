// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

use anyhow::{Context as _, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::runtime::Handle;

use crate::controller::MeasurementStore;
use crate::measurement::Measurement;

pub async fn new_pool(database_url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url)
        .await
        .context("failed to connect to database")
}

pub async fn insert_measurement(pool: &PgPool, measurement: &Measurement) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO scd41 (device, ts, co2, temperature, humidity, status)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (device, ts) DO NOTHING
        "#,
    )
    .bind(measurement.device)
    .bind(measurement.measured_at)
    .bind(measurement.co2_ppm as i32)
    .bind(measurement.temperature_celsius)
    .bind(measurement.humidity_percent)
    .bind(measurement.status)
    .execute(pool)
    .await?;

    Ok(())
}

/// Blocking [`MeasurementStore`] over a PostgreSQL pool, for use outside the runtime.
pub struct PgStore {
    pool: PgPool,
    runtime: Handle,
}

impl PgStore {
    pub fn new(pool: PgPool, runtime: Handle) -> Self {
        PgStore { pool, runtime }
    }
}

impl MeasurementStore for PgStore {
    type Error = sqlx::Error;

    fn insert(&mut self, measurement: &Measurement) -> Result<(), sqlx::Error> {
        self.runtime
            .block_on(insert_measurement(&self.pool, measurement))
    }
}
