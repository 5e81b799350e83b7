use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Envelope returned by `GET <collection>`.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "F: Deserialize<'de>"))]
pub struct ListResponse<F> {
    #[serde(default)]
    pub items: Vec<ItemDto<F>>,
}

/// One remote record as listed by the service. Domain fields are flattened
/// next to the envelope fields, matching the task-list wire format.
#[derive(Debug, Deserialize)]
pub struct ItemDto<F> {
    pub id: String,
    #[serde(default)]
    pub etag: Option<String>,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(flatten)]
    pub fields: F,
}

/// Body sent on `POST` and `PUT`.
#[derive(Debug, Serialize)]
pub struct WriteItem<'a, F> {
    #[serde(flatten)]
    pub fields: &'a F,
    pub updated: DateTime<Utc>,
}

/// Response to `POST <collection>`.
#[derive(Debug, Deserialize)]
pub struct CreatedDto {
    pub id: String,
    #[serde(default)]
    pub etag: Option<String>,
    pub updated: DateTime<Utc>,
}

/// Response to `PUT <collection>/<id>`.
#[derive(Debug, Deserialize)]
pub struct VersionDto {
    #[serde(default)]
    pub etag: Option<String>,
    pub updated: DateTime<Utc>,
}
