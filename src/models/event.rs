use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Collection, SyncMeta, SyncRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFields {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    #[serde(flatten)]
    pub fields: EventFields,
    pub meta: SyncMeta,
}

impl CalendarEvent {
    pub fn new_local(fields: EventFields) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            fields,
            meta: SyncMeta::new_local(),
        }
    }
}

impl SyncRecord for CalendarEvent {
    type Fields = EventFields;

    const COLLECTION: Collection = Collection::Events;

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

    fn fields(&self) -> EventFields {
        self.fields.clone()
    }

    fn apply_fields(&mut self, fields: EventFields) {
        self.fields = fields;
    }

    fn materialize(
        remote_id: String,
        fields: EventFields,
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
