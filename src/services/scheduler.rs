use std::time::Duration;

use tracing::{info, warn};

use crate::state::AppState;

/// Periodic auto-sync: runs a reconciliation pass at a fixed interval.
pub struct SyncScheduler {
    state: AppState,
    interval: Duration,
}

impl SyncScheduler {
    pub fn new(state: AppState, interval_secs: u64) -> Self {
        Self {
            state,
            interval: Duration::from_secs(interval_secs),
        }
    }

    /// Run forever. A failed pass is logged and the loop continues; the
    /// application keeps working on local data either way.
    pub async fn start(mut self) {
        info!("starting auto-sync scheduler (interval: {:?})", self.interval);

        loop {
            tokio::time::sleep(self.interval).await;

            match self.state.sync_now().await {
                Ok(report) => {
                    let stats = report.stats();
                    info!(
                        "auto-sync completed: {} created, {} updated, {} deleted, {} materialized, {} purged, {} failed",
                        stats.created,
                        stats.updated,
                        stats.deleted,
                        stats.materialized,
                        stats.purged,
                        stats.failed
                    );
                }
                Err(err) => {
                    warn!("auto-sync failed: {}", err);
                }
            }
        }
    }
}
