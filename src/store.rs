use std::sync::Arc;

use tracing::info;

use crate::error::AppError;
use crate::models::{AppView, CalendarEvent, EventFields, Snapshot, Task, TaskFields};
use crate::storage::Storage;

/// Sole in-memory authority over the snapshot.
///
/// Every mutation computes the next snapshot, persists it, and only then
/// commits it in memory — so an observer never sees state that was not also
/// durably saved, and a failed save leaves the prior state in place.
///
/// The store assumes a single logical caller at a time; the `&mut self`
/// receivers encode that contract. There is no internal locking — callers
/// running from independent tasks must serialize access themselves.
pub struct Store {
    snapshot: Snapshot,
    storage: Arc<Storage>,
}

impl Store {
    /// Load the persisted document. The second return value reports a
    /// degraded read (missing or corrupt document replaced by the default).
    pub async fn open(storage: Arc<Storage>) -> (Self, bool) {
        let outcome = storage.load().await;
        info!(
            "store opened: {} events, {} tasks",
            outcome.snapshot.events.len(),
            outcome.snapshot.tasks.len()
        );
        (
            Self {
                snapshot: outcome.snapshot,
                storage,
            },
            outcome.degraded,
        )
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Replace the in-memory state with a snapshot the reconciliation engine
    /// already persisted. No save happens here.
    pub fn adopt(&mut self, merged: Snapshot) {
        self.snapshot = merged;
    }

    pub async fn add_event(&mut self, fields: EventFields) -> Result<CalendarEvent, AppError> {
        let event = CalendarEvent::new_local(fields);
        let mut next = self.snapshot.clone();
        next.events.push(event.clone());
        self.commit(next).await?;
        Ok(event)
    }

    pub async fn update_event(&mut self, id: &str, fields: EventFields) -> Result<(), AppError> {
        let mut next = self.snapshot.clone();
        let event = next
            .events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(AppError::NotFound)?;
        event.fields = fields;
        event.meta.touch();
        self.commit(next).await
    }

    /// Soft delete: the record becomes a tombstone and stays in the snapshot
    /// until a sync pass confirms the remote side no longer needs it.
    pub async fn delete_event(&mut self, id: &str) -> Result<(), AppError> {
        let mut next = self.snapshot.clone();
        let event = next
            .events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(AppError::NotFound)?;
        event.meta.deleted = true;
        event.meta.touch();
        self.commit(next).await
    }

    pub async fn add_task(&mut self, fields: TaskFields) -> Result<Task, AppError> {
        let task = Task::new_local(fields);
        let mut next = self.snapshot.clone();
        next.tasks.push(task.clone());
        self.commit(next).await?;
        Ok(task)
    }

    pub async fn update_task(&mut self, id: &str, fields: TaskFields) -> Result<(), AppError> {
        let mut next = self.snapshot.clone();
        let task = next
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(AppError::NotFound)?;
        task.fields = fields;
        task.meta.touch();
        self.commit(next).await
    }

    pub async fn toggle_task(&mut self, id: &str) -> Result<(), AppError> {
        let mut next = self.snapshot.clone();
        let task = next
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(AppError::NotFound)?;
        task.fields.status = task.fields.status.toggled();
        task.meta.touch();
        self.commit(next).await
    }

    pub async fn delete_task(&mut self, id: &str) -> Result<(), AppError> {
        let mut next = self.snapshot.clone();
        let task = next
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(AppError::NotFound)?;
        task.meta.deleted = true;
        task.meta.touch();
        self.commit(next).await
    }

    pub async fn set_view(&mut self, view: AppView) -> Result<(), AppError> {
        let mut next = self.snapshot.clone();
        next.settings.view = view;
        self.commit(next).await
    }

    pub async fn set_credential(
        &mut self,
        access_token: Option<String>,
        refresh_token: Option<String>,
    ) -> Result<(), AppError> {
        let mut next = self.snapshot.clone();
        next.settings.access_token = access_token;
        next.settings.refresh_token = refresh_token;
        self.commit(next).await
    }

    async fn commit(&mut self, next: Snapshot) -> Result<(), AppError> {
        self.storage.save(&next).await?;
        self.snapshot = next;
        Ok(())
    }
}
