use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::{CalendarEvent, Collection, Snapshot, SyncRecord, Task};
use crate::remote::{RemoteCollection, RemoteRecord};
use crate::storage::Storage;

/// Per-record outcome of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncOutcome {
    /// Uploaded for the first time; the remote id was adopted locally.
    Created { remote_id: String },
    /// Fields propagated from the newer replica to the older one.
    Updated,
    /// Tombstone propagated: the remote record was deleted, the local one purged.
    Deleted,
    /// New local record built from a remote item with no local counterpart.
    Materialized,
    /// Local record physically removed without a remote call.
    Purged,
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordOutcome {
    pub collection: Collection,
    pub title: String,
    pub outcome: SyncOutcome,
}

#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    pub entries: Vec<RecordOutcome>,
}

impl SyncReport {
    fn record(&mut self, collection: Collection, title: &str, outcome: SyncOutcome) {
        self.entries.push(RecordOutcome {
            collection,
            title: title.to_string(),
            outcome,
        });
    }

    pub fn failures(&self) -> impl Iterator<Item = &RecordOutcome> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, SyncOutcome::Failed { .. }))
    }

    pub fn stats(&self) -> SyncStats {
        let mut stats = SyncStats::default();
        for entry in &self.entries {
            match entry.outcome {
                SyncOutcome::Created { .. } => stats.created += 1,
                SyncOutcome::Updated => stats.updated += 1,
                SyncOutcome::Deleted => stats.deleted += 1,
                SyncOutcome::Materialized => stats.materialized += 1,
                SyncOutcome::Purged => stats.purged += 1,
                SyncOutcome::Failed { .. } => stats.failed += 1,
            }
        }
        stats
    }
}

#[derive(Debug, Default, Serialize)]
pub struct SyncStats {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub materialized: usize,
    pub purged: usize,
    pub failed: usize,
}

/// The reconciliation engine: one full two-way pass over both collections.
pub struct SyncService {
    storage: Arc<Storage>,
    tasks: Arc<dyn RemoteCollection<Record = Task>>,
    events: Arc<dyn RemoteCollection<Record = CalendarEvent>>,
    in_flight: AtomicBool,
}

impl SyncService {
    pub fn new(
        storage: Arc<Storage>,
        tasks: Arc<dyn RemoteCollection<Record = Task>>,
        events: Arc<dyn RemoteCollection<Record = CalendarEvent>>,
    ) -> Self {
        Self {
            storage,
            tasks,
            events,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Run one reconciliation pass over a copy of the snapshot and return the
    /// merged replacement plus the per-record report.
    ///
    /// The merged snapshot is saved exactly once, atomically, at the end of
    /// the pass. A second pass invoked while one is running is rejected with
    /// `SyncInProgress`: two passes racing over the same snapshot could
    /// double-create remote records.
    pub async fn run_sync(&self, snapshot: Snapshot) -> Result<(Snapshot, SyncReport), AppError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(AppError::SyncInProgress);
        }
        let result = self.run_pass(snapshot).await;
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn run_pass(&self, mut snapshot: Snapshot) -> Result<(Snapshot, SyncReport), AppError> {
        let credential = snapshot
            .settings
            .access_token
            .clone()
            .ok_or(AppError::CredentialMissing)?;

        info!("starting sync pass");
        let mut report = SyncReport::default();

        let tasks = std::mem::take(&mut snapshot.tasks);
        snapshot.tasks = reconcile(tasks, self.tasks.as_ref(), &credential, &mut report).await;

        let events = std::mem::take(&mut snapshot.events);
        snapshot.events = reconcile(events, self.events.as_ref(), &credential, &mut report).await;

        snapshot.settings.last_sync = Some(Utc::now());

        // One save for the whole pass. A crash or failure here leaves the
        // previously saved document untouched and fails the pass.
        self.storage.save(&snapshot).await?;

        let stats = report.stats();
        info!(
            "sync pass finished: {} created, {} updated, {} deleted, {} materialized, {} purged, {} failed",
            stats.created, stats.updated, stats.deleted, stats.materialized, stats.purged, stats.failed
        );
        for failure in report.failures() {
            warn!("sync failed for '{}': {:?}", failure.title, failure.outcome);
        }

        Ok((snapshot, report))
    }
}

/// Last-write-wins over `updated_at`. Equal instants resolve to the remote
/// copy so both replicas converge deterministically.
fn remote_wins(local_updated: DateTime<Utc>, remote_updated: DateTime<Utc>) -> bool {
    remote_updated >= local_updated
}

/// Reconcile one collection against its remote counterpart.
///
/// Remote calls are issued one record at a time so the consumed/unconsumed
/// bookkeeping against the single fetched list stays consistent. A failed
/// call is recorded in the report and does not stop the rest of the pass.
async fn reconcile<R: SyncRecord>(
    locals: Vec<R>,
    remote: &dyn RemoteCollection<Record = R>,
    credential: &str,
    report: &mut SyncReport,
) -> Vec<R> {
    let listed = match remote.list(credential, true).await {
        Ok(items) => items,
        Err(err) => {
            warn!("listing {:?} failed: {}", R::COLLECTION, err);
            report.record(
                R::COLLECTION,
                "(list)",
                SyncOutcome::Failed {
                    reason: err.to_string(),
                },
            );
            return locals;
        }
    };

    let mut unmatched: HashMap<String, RemoteRecord<R::Fields>> = listed
        .into_iter()
        .map(|item| (item.remote_id.clone(), item))
        .collect();

    let mut merged = Vec::with_capacity(locals.len());

    for mut record in locals {
        let remote_id = record.meta().remote_id.clone();
        let deleted = record.meta().deleted;
        match (remote_id, deleted) {
            // Tombstone that reached the remote: confirm the deletion there,
            // then purge. A remote 404 counts as confirmation.
            (Some(remote_id), true) => {
                unmatched.remove(&remote_id);
                match remote.delete(credential, &remote_id).await {
                    Ok(()) | Err(AppError::NotFound) => {
                        report.record(R::COLLECTION, record.title(), SyncOutcome::Deleted);
                    }
                    Err(err) => {
                        report.record(
                            R::COLLECTION,
                            record.title(),
                            SyncOutcome::Failed {
                                reason: err.to_string(),
                            },
                        );
                        merged.push(record);
                    }
                }
            }
            (Some(remote_id), false) => match unmatched.remove(&remote_id) {
                Some(listed) => {
                    if let Some(resolved) =
                        resolve_pair(record, listed, remote, credential, report).await
                    {
                        merged.push(resolved);
                    }
                }
                None => {
                    // The remote side no longer lists it: deletion confirmed.
                    report.record(R::COLLECTION, record.title(), SyncOutcome::Purged);
                }
            },
            // Never uploaded: push it up and adopt the returned identity.
            (None, false) => {
                let updated_at = record.meta().updated_at;
                match remote.create(credential, &record.fields(), updated_at).await {
                    Ok(created) => {
                        {
                            let meta = record.meta_mut();
                            meta.remote_id = Some(created.remote_id.clone());
                            meta.etag = created.etag;
                            meta.updated_at = created.updated_at;
                            meta.synced_at = Some(Utc::now());
                        }
                        report.record(
                            R::COLLECTION,
                            record.title(),
                            SyncOutcome::Created {
                                remote_id: created.remote_id,
                            },
                        );
                        merged.push(record);
                    }
                    Err(err) => {
                        report.record(
                            R::COLLECTION,
                            record.title(),
                            SyncOutcome::Failed {
                                reason: err.to_string(),
                            },
                        );
                        merged.push(record);
                    }
                }
            }
            // Tombstone that never left the device: purge, no network call.
            (None, true) => {
                report.record(R::COLLECTION, record.title(), SyncOutcome::Purged);
            }
        }
    }

    // Whatever the remote listed but nothing local claimed has no local
    // counterpart yet. Remote tombstones are not resurrected.
    let mut leftovers: Vec<RemoteRecord<R::Fields>> = unmatched.into_values().collect();
    leftovers.sort_by(|a, b| a.remote_id.cmp(&b.remote_id));
    for item in leftovers {
        if item.deleted {
            continue;
        }
        let record = R::materialize(item.remote_id, item.fields, item.updated_at, item.etag);
        report.record(R::COLLECTION, record.title(), SyncOutcome::Materialized);
        merged.push(record);
    }

    merged
}

/// Conflict resolution for a matched local/remote pair.
async fn resolve_pair<R: SyncRecord>(
    mut record: R,
    listed: RemoteRecord<R::Fields>,
    remote: &dyn RemoteCollection<Record = R>,
    credential: &str,
    report: &mut SyncReport,
) -> Option<R> {
    let local_updated = record.meta().updated_at;

    if !remote_wins(local_updated, listed.updated_at) {
        // Local is strictly newer: push local fields, keep the local
        // timestamp, refresh the version token from the response.
        match remote
            .update(credential, &listed.remote_id, &record.fields(), local_updated)
            .await
        {
            Ok(version) => {
                let meta = record.meta_mut();
                meta.etag = version.etag;
                meta.synced_at = Some(Utc::now());
                report.record(R::COLLECTION, record.title(), SyncOutcome::Updated);
            }
            Err(err) => {
                report.record(
                    R::COLLECTION,
                    record.title(),
                    SyncOutcome::Failed {
                        reason: err.to_string(),
                    },
                );
            }
        }
        return Some(record);
    }

    if listed.deleted {
        // The newer side is a remote tombstone: the record is gone.
        report.record(R::COLLECTION, record.title(), SyncOutcome::Purged);
        return None;
    }

    if listed.updated_at == local_updated && listed.fields == record.fields() {
        // Already converged; leave the record untouched.
        return Some(record);
    }

    // Remote wins (including the equal-timestamp tie): overwrite local fields,
    // adopt the remote timestamp and version token, keep the local id.
    record.apply_fields(listed.fields);
    let meta = record.meta_mut();
    meta.updated_at = listed.updated_at;
    meta.etag = listed.etag;
    meta.synced_at = Some(Utc::now());
    report.record(R::COLLECTION, record.title(), SyncOutcome::Updated);
    Some(record)
}
