//! Periodic Task
//!
//! Cancellable "wait, run, wait again" loop shared by the sweepers.

use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic>")
}

/// Background loop that runs a job once per interval
///
/// The interval is measured from the end of one run to the start of the
/// next, so runs never overlap. At most one loop is armed at a time:
/// `start` replaces any running loop, `stop` cancels it.
pub struct PeriodicTask {
    name: &'static str,
    interval: Duration,
    running: Mutex<Option<CancellationToken>>,
    // Held for the duration of each run, shared across restarts
    run_lock: Arc<Mutex<()>>,
}

impl PeriodicTask {
    pub fn new(name: &'static str, interval: Duration) -> Self {
        Self {
            name,
            interval,
            running: Mutex::new(None),
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Arm the loop, replacing any loop already armed
    ///
    /// Must be called from within a Tokio runtime. `job` runs synchronously
    /// on a runtime worker and must not wait on async work: while a replaced
    /// loop finishes its last run, the new loop parks its worker on a
    /// blocking lock. A panicking run is logged and the loop keeps going
    /// (with `panic = "abort"` the process exits instead).
    pub fn start<F>(&self, job: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut running = self.running.lock();
        if let Some(previous) = running.take() {
            previous.cancel();
            debug!(task = self.name, "Rescheduling periodic task");
        }

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let run_lock = self.run_lock.clone();
        let interval = self.interval;
        let name = self.name;

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }

                // A replaced loop may still be finishing its last run
                let _guard = run_lock.lock();
                if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(&job)) {
                    warn!(task = name, panic = panic_message(&*panic), "Periodic run panicked");
                }
            }
            debug!(task = name, "Periodic task loop exited");
        });

        *running = Some(token);
        info!(task = self.name, interval = ?self.interval, "Periodic task started");
    }

    /// Cancel the pending wait; a run already in progress completes
    pub fn stop(&self) {
        if let Some(token) = self.running.lock().take() {
            token.cancel();
            info!(task = self.name, "Periodic task stopped");
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        if let Some(token) = self.running.get_mut().take() {
            token.cancel();
        }
    }
}
