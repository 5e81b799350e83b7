#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use flem::error::AppError;
use flem::models::{
    CalendarEvent, EventFields, Snapshot, SyncMeta, SyncRecord, Task, TaskFields, TaskStatus,
};
use flem::remote::{CreatedRemote, FieldsOf, RemoteCollection, RemoteRecord, RemoteVersion};
use flem::services::SyncService;
use flem::storage::Storage;

pub struct FakeItem<F> {
    pub id: String,
    pub fields: F,
    pub updated: DateTime<Utc>,
    pub etag: Option<String>,
    pub deleted: bool,
}

/// In-memory stand-in for one remote collection, with call counters and
/// failure injection.
pub struct FakeRemote<R: SyncRecord> {
    pub items: Mutex<Vec<FakeItem<R::Fields>>>,
    next_id: AtomicUsize,
    pub lists: AtomicUsize,
    pub creates: AtomicUsize,
    pub updates: AtomicUsize,
    pub deletes: AtomicUsize,
    pub fail_lists: AtomicBool,
    pub fail_creates: AtomicBool,
    pub list_delay: Mutex<Option<Duration>>,
}

impl<R: SyncRecord> FakeRemote<R> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
            lists: AtomicUsize::new(0),
            creates: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            fail_lists: AtomicBool::new(false),
            fail_creates: AtomicBool::new(false),
            list_delay: Mutex::new(None),
        }
    }

    pub fn seed(&self, id: &str, fields: R::Fields, updated: DateTime<Utc>) {
        self.items.lock().unwrap().push(FakeItem {
            id: id.to_string(),
            fields,
            updated,
            etag: Some("etag-0".to_string()),
            deleted: false,
        });
    }

    pub fn seed_deleted(&self, id: &str, fields: R::Fields, updated: DateTime<Utc>) {
        self.items.lock().unwrap().push(FakeItem {
            id: id.to_string(),
            fields,
            updated,
            etag: Some("etag-0".to_string()),
            deleted: true,
        });
    }

    pub fn item_fields(&self, id: &str) -> Option<(R::Fields, DateTime<Utc>)> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == id)
            .map(|i| (i.fields.clone(), i.updated))
    }

    pub fn item_count(&self) -> usize {
        self.items.lock().unwrap().len()
    }
}

#[async_trait]
impl<R: SyncRecord> RemoteCollection for FakeRemote<R> {
    type Record = R;

    async fn list(
        &self,
        _credential: &str,
        include_deleted_and_hidden: bool,
    ) -> Result<Vec<RemoteRecord<FieldsOf<R>>>, AppError> {
        let delay = *self.list_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.lists.fetch_add(1, Ordering::SeqCst);
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(AppError::RemoteUnavailable("connection reset".to_string()));
        }
        let items = self.items.lock().unwrap();
        Ok(items
            .iter()
            .filter(|i| include_deleted_and_hidden || !i.deleted)
            .map(|i| RemoteRecord {
                remote_id: i.id.clone(),
                fields: i.fields.clone(),
                updated_at: i.updated,
                etag: i.etag.clone(),
                deleted: i.deleted,
            })
            .collect())
    }

    async fn create(
        &self,
        _credential: &str,
        fields: &FieldsOf<R>,
        updated_at: DateTime<Utc>,
    ) -> Result<CreatedRemote, AppError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(AppError::RemoteUnavailable("connection reset".to_string()));
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let id = format!("remote-{}", n);
        let etag = Some(format!("etag-{}", n));
        self.items.lock().unwrap().push(FakeItem {
            id: id.clone(),
            fields: fields.clone(),
            updated: updated_at,
            etag: etag.clone(),
            deleted: false,
        });
        Ok(CreatedRemote {
            remote_id: id,
            etag,
            updated_at,
        })
    }

    async fn update(
        &self,
        _credential: &str,
        remote_id: &str,
        fields: &FieldsOf<R>,
        updated_at: DateTime<Utc>,
    ) -> Result<RemoteVersion, AppError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut items = self.items.lock().unwrap();
        let item = items
            .iter_mut()
            .find(|i| i.id == remote_id)
            .ok_or(AppError::NotFound)?;
        item.fields = fields.clone();
        item.updated = updated_at;
        item.etag = Some(format!("etag-{}", self.next_id.fetch_add(1, Ordering::SeqCst)));
        Ok(RemoteVersion {
            etag: item.etag.clone(),
            updated_at,
        })
    }

    async fn delete(&self, _credential: &str, remote_id: &str) -> Result<(), AppError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        let mut items = self.items.lock().unwrap();
        let pos = items
            .iter()
            .position(|i| i.id == remote_id)
            .ok_or(AppError::NotFound)?;
        items.remove(pos);
        Ok(())
    }
}

/// A fresh storage rooted in a unique temp directory, already initialised.
pub async fn temp_storage() -> Arc<Storage> {
    let dir = std::env::temp_dir().join(format!("flem-test-{}", Uuid::new_v4()));
    let storage = Arc::new(Storage::new(dir));
    storage.init().await.expect("storage init");
    storage
}

pub struct Harness {
    pub storage: Arc<Storage>,
    pub tasks: Arc<FakeRemote<Task>>,
    pub events: Arc<FakeRemote<CalendarEvent>>,
    pub sync: SyncService,
}

pub async fn harness() -> Harness {
    let storage = temp_storage().await;
    let tasks = Arc::new(FakeRemote::<Task>::new());
    let events = Arc::new(FakeRemote::<CalendarEvent>::new());
    let sync = SyncService::new(storage.clone(), tasks.clone(), events.clone());
    Harness {
        storage,
        tasks,
        events,
        sync,
    }
}

/// A fixed instant; `hour` keeps relative ordering readable in tests.
pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, hour, 0, 0).unwrap()
}

pub fn task_fields(title: &str) -> TaskFields {
    TaskFields {
        title: title.to_string(),
        notes: None,
        status: TaskStatus::NeedsAction,
        due: None,
    }
}

pub fn event_fields(title: &str) -> EventFields {
    EventFields {
        title: title.to_string(),
        description: None,
        start: at(9),
        end: at(10),
        all_day: false,
        color: None,
    }
}

pub fn unsynced_task(title: &str, updated_at: DateTime<Utc>) -> Task {
    Task {
        id: Uuid::new_v4().to_string(),
        fields: task_fields(title),
        meta: SyncMeta {
            remote_id: None,
            etag: None,
            updated_at,
            deleted: false,
            synced_at: None,
        },
    }
}

pub fn synced_task(title: &str, remote_id: &str, updated_at: DateTime<Utc>) -> Task {
    let mut task = unsynced_task(title, updated_at);
    task.meta.remote_id = Some(remote_id.to_string());
    task.meta.etag = Some("etag-0".to_string());
    task
}

pub fn snapshot_with_token(tasks: Vec<Task>) -> Snapshot {
    let mut snapshot = Snapshot::default();
    snapshot.tasks = tasks;
    snapshot.settings.access_token = Some("test-token".to_string());
    snapshot
}
