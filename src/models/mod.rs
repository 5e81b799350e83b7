pub mod event;
pub mod task;

pub use event::{CalendarEvent, EventFields};
pub use task::{Task, TaskFields, TaskStatus};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Sync bookkeeping attached to every record.
///
/// `remote_id` stays `None` until the record has been created remotely and is
/// never cleared afterwards; the record itself is purged instead. `updated_at`
/// only ever moves forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>,
}

impl SyncMeta {
    /// Metadata for a record that was just created on this device.
    pub fn new_local() -> Self {
        Self {
            remote_id: None,
            etag: None,
            updated_at: Utc::now(),
            deleted: false,
            synced_at: None,
        }
    }

    /// Advance `updated_at` to now, guarding against clock regressions so the
    /// timestamp stays monotonically non-decreasing.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.updated_at);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppView {
    #[default]
    All,
    Calendar,
    Tasks,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default)]
    pub view: AppView,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Utc>>,
}

/// The whole persisted document: every event, task and setting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub events: Vec<CalendarEvent>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub settings: AppSettings,
}

/// Which record collection a sync outcome belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Tasks,
    Events,
}

/// The seam that lets one reconciliation routine run over both collections.
///
/// `Fields` is the record's domain payload as it travels over the wire and
/// across replicas; the local `id` and the `SyncMeta` block stay behind.
pub trait SyncRecord: Clone + Send + Sync + 'static {
    type Fields: Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static;

    const COLLECTION: Collection;

    fn id(&self) -> &str;
    fn title(&self) -> &str;
    fn meta(&self) -> &SyncMeta;
    fn meta_mut(&mut self) -> &mut SyncMeta;
    fn fields(&self) -> Self::Fields;
    fn apply_fields(&mut self, fields: Self::Fields);

    /// Build a brand new local record from a remote item that has no local
    /// counterpart. The local id is freshly generated; `remote_id` is set.
    fn materialize(
        remote_id: String,
        fields: Self::Fields,
        updated_at: DateTime<Utc>,
        etag: Option<String>,
    ) -> Self;
}
