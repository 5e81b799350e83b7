use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Collection, SyncMeta, SyncRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "needsAction")]
    NeedsAction,
    #[serde(rename = "completed")]
    Completed,
}

impl TaskStatus {
    pub fn toggled(self) -> Self {
        match self {
            TaskStatus::NeedsAction => TaskStatus::Completed,
            TaskStatus::Completed => TaskStatus::NeedsAction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskFields {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(flatten)]
    pub fields: TaskFields,
    pub meta: SyncMeta,
}

impl Task {
    pub fn new_local(fields: TaskFields) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            fields,
            meta: SyncMeta::new_local(),
        }
    }
}

impl SyncRecord for Task {
    type Fields = TaskFields;

    const COLLECTION: Collection = Collection::Tasks;

    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.fields.title
    }

    fn meta(&self) -> &SyncMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut SyncMeta {
        &mut self.meta
    }

    fn fields(&self) -> TaskFields {
        self.fields.clone()
    }

    fn apply_fields(&mut self, fields: TaskFields) {
        self.fields = fields;
    }

    fn materialize(
        remote_id: String,
        fields: TaskFields,
        updated_at: DateTime<Utc>,
        etag: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            fields,
            meta: SyncMeta {
                remote_id: Some(remote_id),
                etag,
                updated_at,
                deleted: false,
                synced_at: Some(Utc::now()),
            },
        }
    }
}
