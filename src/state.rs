use std::sync::Arc;

use crate::error::AppError;
use crate::services::{SyncReport, SyncService};
use crate::storage::Storage;
use crate::store::Store;

/// Application root state: the store is the single owner of the snapshot;
/// the sync service reconciles copies of it. Owned explicitly by the entry
/// point and passed down, never kept in a global.
pub struct AppState {
    pub store: Store,
    pub sync: Arc<SyncService>,
}

impl AppState {
    /// Load the persisted document and assemble the root state. The second
    /// return value reports a degraded read.
    pub async fn init(storage: Arc<Storage>, sync: Arc<SyncService>) -> (Self, bool) {
        let (store, degraded) = Store::open(storage).await;
        (Self { store, sync }, degraded)
    }

    /// One reconciliation pass: hand the engine a copy of the snapshot, then
    /// adopt the merged replacement it already persisted.
    pub async fn sync_now(&mut self) -> Result<SyncReport, AppError> {
        let (merged, report) = self.sync.run_sync(self.store.snapshot().clone()).await?;
        self.store.adopt(merged);
        Ok(report)
    }
}
