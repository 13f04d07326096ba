// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Default)]
struct Flags {
    measuring: bool,
    shutdown_requested: bool,
}

/// State shared between the measurement loop and the shutdown observer.
///
/// Both flags live behind one mutex so a session can never begin after the
/// observer has decided the sensor is idle.
#[derive(Debug, Default)]
pub struct SessionState {
    flags: Mutex<Flags>,
}

impl SessionState {
    pub fn new() -> Self {
        SessionState::default()
    }

    fn lock(&self) -> MutexGuard<'_, Flags> {
        // The flags are plain booleans, a poisoned lock still holds valid data.
        self.flags.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Marks a session as running. `None` once shutdown was requested.
    pub fn begin_measuring(&self) -> Option<MeasuringGuard<'_>> {
        let mut flags = self.lock();
        if flags.shutdown_requested {
            return None;
        }
        flags.measuring = true;
        Some(MeasuringGuard { state: self })
    }

    /// Runs `f` with the measuring flag held, so the shutdown observer waits
    /// for it. `None` without calling `f` once shutdown was requested.
    pub fn run_exclusive<T>(&self, f: impl FnOnce() -> T) -> Option<T> {
        let _guard = self.begin_measuring()?;
        Some(f())
    }

    pub fn is_measuring(&self) -> bool {
        self.lock().measuring
    }

    /// Sets the shutdown flag. It is never cleared.
    pub fn request_shutdown(&self) {
        self.lock().shutdown_requested = true;
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.lock().shutdown_requested
    }

    /// Blocks until no session is running, checking every `interval`.
    /// `on_wait` runs before each pause.
    pub fn wait_until_idle(&self, interval: Duration, mut on_wait: impl FnMut()) {
        while self.is_measuring() {
            on_wait();
            std::thread::sleep(interval);
        }
    }
}

/// Clears the measuring flag when dropped, including on unwind.
#[derive(Debug)]
pub struct MeasuringGuard<'a> {
    state: &'a SessionState,
}

impl Drop for MeasuringGuard<'_> {
    fn drop(&mut self) {
        self.state.lock().measuring = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn guard_clears_flag() {
        let state = SessionState::new();
        {
            let _guard = state.begin_measuring().unwrap();
            assert!(state.is_measuring());
        }
        assert!(!state.is_measuring());
    }

    #[test]
    fn guard_clears_flag_on_panic() {
        let state = Arc::new(SessionState::new());
        let worker = Arc::clone(&state);
        let result = thread::spawn(move || {
            let _guard = worker.begin_measuring().unwrap();
            panic!("sensor wedged");
        })
        .join();
        assert!(result.is_err());
        assert!(!state.is_measuring());
    }

    #[test]
    fn no_session_after_shutdown() {
        let state = SessionState::new();
        state.request_shutdown();
        assert!(state.begin_measuring().is_none());
        assert!(state.is_shutdown_requested());
    }

    #[test]
    fn exclusive_holds_flag() {
        let state = SessionState::new();
        assert_eq!(state.run_exclusive(|| state.is_measuring()), Some(true));
        assert!(!state.is_measuring());
    }

    #[test]
    fn exclusive_skipped_after_shutdown() {
        let state = SessionState::new();
        state.request_shutdown();
        let mut called = false;
        assert_eq!(state.run_exclusive(|| called = true), None);
        assert!(!called);
    }

    #[test]
    fn observer_waits_for_running_session() {
        let state = Arc::new(SessionState::new());
        let guard_state = Arc::clone(&state);
        let (hold_tx, hold_rx) = mpsc::channel::<()>();
        let (started_tx, started_rx) = mpsc::channel::<()>();

        let session = thread::spawn(move || {
            let _guard = guard_state.begin_measuring().unwrap();
            started_tx.send(()).unwrap();
            hold_rx.recv().unwrap();
        });
        started_rx.recv().unwrap();

        let (done_tx, done_rx) = mpsc::channel::<()>();
        let observer_state = Arc::clone(&state);
        let observer = thread::spawn(move || {
            observer_state.request_shutdown();
            observer_state.wait_until_idle(Duration::from_millis(5), || {});
            done_tx.send(()).unwrap();
        });

        assert!(done_rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert!(state.is_measuring());

        hold_tx.send(()).unwrap();
        session.join().unwrap();
        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        observer.join().unwrap();
        assert!(!state.is_measuring());
    }
}
