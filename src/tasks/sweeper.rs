//! Background sweep task
//!
//! Periodically removes expired cache entries and elapsed rate-limit
//! windows, independent of request traffic. The task is tied to process
//! lifecycle: started once at boot and stopped explicitly on shutdown
//! through a watch channel, so nothing keeps ticking after the server
//! drains.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::AppState;

/// Handle to the running sweep task
pub struct Sweeper {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Spawn the sweep loop
    pub fn start(state: Arc<AppState>, interval: Duration) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            info!(interval_s = interval.as_secs(), "Starting background sweeper");

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately; skip it so the loop
            // waits a full interval before the first sweep.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let (entries, windows) = sweep_once(&state);
                        if entries > 0 || windows > 0 {
                            debug!(entries, windows, "Sweep removed stale state");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        info!("Background sweeper shutting down");
                        break;
                    }
                }
            }
        });

        Self { shutdown, handle }
    }

    /// Stop the sweep loop and wait for it to finish
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}

/// One synchronous pass over every cache and limiter
///
/// Must not await mid-scan: each purge takes and releases its own lock.
fn sweep_once(state: &AppState) -> (usize, usize) {
    let mut entries = 0;
    for cache in state.caches.all() {
        entries += cache.purge_expired();
    }

    let mut windows = 0;
    for limiter in state.limiters.all() {
        windows += limiter.sweep();
    }

    (entries, windows)
}
