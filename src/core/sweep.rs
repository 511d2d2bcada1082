//! Timer-driven sweeps with an owned, cancellable handle.
//!
//! The engines' periodic work (`check_expired_budgets`, daily goal
//! reminders) is idempotent, so a tick that races a foreground mutation in a
//! multi-threaded host is harmless as long as the host serializes access,
//! typically by handing the timer a closure that locks an `Arc<Mutex<_>>`.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Spawns recurring background work tied to a [`SweepHandle`].
pub struct SweepTimer;

impl SweepTimer {
    /// Runs `tick` every `interval` until the handle is stopped or dropped.
    pub fn start<F>(interval: Duration, mut tick: F) -> SweepHandle
    where
        F: FnMut() + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let worker = thread::spawn(move || loop {
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => tick(),
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });
        SweepHandle {
            stop: Some(stop_tx),
            worker: Some(worker),
        }
    }
}

/// Owns a running sweep; stopping (or dropping) it ends the recurring work
/// so timers cannot leak past shutdown.
pub struct SweepHandle {
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl SweepHandle {
    /// Stops the timer and waits for the worker thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn ticks_until_stopped() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let handle = SweepTimer::start(Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        thread::sleep(Duration::from_millis(60));
        handle.stop();
        let seen = ticks.load(Ordering::SeqCst);
        assert!(seen >= 2, "expected at least two ticks, saw {seen}");
        thread::sleep(Duration::from_millis(30));
        assert_eq!(ticks.load(Ordering::SeqCst), seen, "ticks after stop");
    }

    #[test]
    fn dropping_the_handle_stops_the_timer() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        {
            let _handle = SweepTimer::start(Duration::from_millis(10), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            thread::sleep(Duration::from_millis(35));
        }
        let seen = ticks.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(ticks.load(Ordering::SeqCst), seen);
    }
}
