use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::info;

use super::{clock::Clock, TokenCache};

/// Background worker that keeps the token cache bounded: expired entries are
/// swept on the clean interval, and the whole cache is dropped on the purge
/// interval. A tick that fires while the previous one still runs is skipped.
pub struct CacheSweeper {
    cache: Arc<TokenCache>,
    clock: Arc<dyn Clock>,
    clean_interval: std::time::Duration,
    purge_interval: std::time::Duration,
    /// Shutdown listener
    shutdown_rx: Arc<RwLock<mpsc::Receiver<()>>>,
    /// Shutdown transmitter
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheSweeper {
    pub fn new(
        cache: Arc<TokenCache>,
        clock: impl Clock,
        clean_interval: std::time::Duration,
        purge_interval: std::time::Duration,
    ) -> Self {
        let (tx, rx) = mpsc::channel(1);

        Self {
            cache,
            clock: Arc::new(clock),
            clean_interval,
            purge_interval,
            shutdown_rx: Arc::new(RwLock::new(rx)),
            shutdown_tx: tx,
        }
    }

    /// Run the sweep loop until shutdown.
    #[tracing::instrument(skip(self), name = "start_cache_sweeper")]
    pub async fn start(&self) {
        let mut shutdown_rx = self.shutdown_rx.write().await;

        let mut clean = tokio::time::interval(self.clean_interval);
        clean.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut purge = tokio::time::interval(self.purge_interval);
        purge.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick of an interval fires immediately
        clean.tick().await;
        purge.tick().await;

        loop {
            tokio::select! {
                _ = clean.tick() => {
                    self.cache.sweep(self.clock.now());
                }
                _ = purge.tick() => {
                    self.cache.purge();
                }
                _ = shutdown_rx.recv() => {
                    break;
                }
            }
        }

        info!("Cache sweeper shutting down");
    }

    /// Stop the sweep loop.
    #[tracing::instrument(skip(self), name = "stop_cache_sweeper")]
    pub async fn stop(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}
