// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context as _, Result};
use log::{error, info};
use scd41_i2c::SessionState;
use tokio::runtime::Handle;
use tokio::signal::unix::{SignalKind, signal};

const IDLE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Spawns the thread that turns SIGINT/SIGTERM into a shutdown request.
///
/// After the request it waits for any running session to finish, runs
/// `on_exit` and terminates the process, so the bus is never abandoned in
/// the middle of a transaction.
pub fn spawn_observer(
    runtime: Handle,
    state: Arc<SessionState>,
    on_exit: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("shutdown-observer".to_string())
        .spawn(move || {
            match runtime.block_on(wait_for_signal()) {
                Ok(name) => info!("received {name}, stopping safely"),
                Err(e) => {
                    error!("{e:#}");
                    return;
                }
            }

            state.request_shutdown();
            state.wait_until_idle(IDLE_POLL_INTERVAL, || {
                info!("measurement in progress, waiting for it to finish")
            });

            info!("shutting down");
            on_exit();
            std::process::exit(0);
        })
}

async fn wait_for_signal() -> Result<&'static str> {
    let mut terminate =
        signal(SignalKind::terminate()).context("failed to listen for SIGTERM")?;

    tokio::select! {
        interrupted = tokio::signal::ctrl_c() => {
            interrupted.context("failed to listen for SIGINT")?;
            Ok("SIGINT")
        }
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}
