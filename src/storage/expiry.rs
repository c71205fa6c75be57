//! Background Expiry Sweeper
//!
//! Each [`Store`] gets exactly one sweeper task. The task wakes up on a fixed
//! interval, walks every key of its store and removes the keys whose deadline
//! has been reached.
//!
//! ## Design
//!
//! The sweeper runs as a Tokio task and:
//! 1. Sleeps for the configured interval (default: 250ms)
//! 2. Enumerates the store's keys
//! 3. Removes every key whose deadline is `<= now`
//! 4. Resets malformed deadlines instead of failing the pass
//!
//! The task stops when its [`ExpirySweeper`] handle is stopped or dropped.

use crate::storage::engine::Store;
use crate::storage::value::unix_now;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Configuration for the expiry sweeper.
#[derive(Debug, Clone)]
pub struct ExpiryConfig {
    /// Pause between two full passes (default: 250ms)
    pub interval: Duration,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(250),
        }
    }
}

impl ExpiryConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Keys inspected
    pub scanned: usize,
    /// Keys removed because their deadline passed
    pub removed: usize,
    /// Keys whose malformed deadline was reset
    pub reset: usize,
}

/// Runs one full pass over `store`, treating `now` as the current unix time.
///
/// Keys removed concurrently by a client are skipped silently.
pub fn sweep_pass(store: &Store, now: i64) -> SweepReport {
    let mut report = SweepReport::default();

    for key in store.keys() {
        report.scanned += 1;

        let deadline = match store.deadline(&key) {
            Ok(Some(deadline)) => deadline,
            // No expiry, or the key vanished since `keys()`
            Ok(None) | Err(_) => continue,
        };

        if deadline <= 0 {
            warn!(
                db = %store.id(),
                key = %key,
                deadline,
                "Unreadable ttl, resetting key to no expiry"
            );
            if store.persist(&key).is_ok() {
                report.reset += 1;
            }
            continue;
        }

        if store.remove_if_expired(&key, now) {
            debug!(db = %store.id(), key = %key, "Key removed, ttl expired");
            report.removed += 1;
        }
    }

    report
}

/// A handle to a running expiry sweeper.
///
/// When this handle is dropped, the sweeper task will be stopped.
#[derive(Debug)]
pub struct ExpirySweeper {
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ExpirySweeper {
    /// Starts the expiry sweeper for `store` as a background task.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use junokv::storage::{ExpiryConfig, ExpirySweeper, Store};
    /// use std::sync::Arc;
    ///
    /// let store = Arc::new(Store::new("0"));
    /// let sweeper = ExpirySweeper::start(store, ExpiryConfig::default());
    ///
    /// // Dropping the sweeper will stop it
    /// drop(sweeper);
    /// ```
    pub fn start(store: Arc<Store>, config: ExpiryConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        debug!(
            db = %store.id(),
            interval_ms = config.interval.as_millis() as u64,
            "Expiry sweeper started"
        );
        let task = tokio::spawn(sweeper_loop(store, config, shutdown_rx));

        Self { shutdown_tx, task }
    }

    /// Stops the expiry sweeper.
    ///
    /// This is called automatically when the handle is dropped.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Returns true while the task is alive and has not been told to stop.
    pub fn is_running(&self) -> bool {
        !*self.shutdown_tx.borrow() && !self.task.is_finished()
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The main sweeper loop.
async fn sweeper_loop(
    store: Arc<Store>,
    config: ExpiryConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(config.interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!(db = %store.id(), "Expiry sweeper received shutdown signal");
                    return;
                }
            }
        }

        let report = sweep_pass(&store, unix_now());

        if report.removed > 0 || report.reset > 0 {
            debug!(
                db = %store.id(),
                removed = report.removed,
                reset = report.reset,
                keys_remaining = store.len(),
                "Expired keys cleaned up"
            );
        } else {
            trace!(db = %store.id(), scanned = report.scanned, "Sweep pass finished");
        }
    }
}
