pub mod dto;

use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};

use crate::error::AppError;
use crate::models::SyncRecord;

pub type FieldsOf<R> = <R as SyncRecord>::Fields;

/// A remote record as reported by `list`.
#[derive(Debug, Clone)]
pub struct RemoteRecord<F> {
    pub remote_id: String,
    pub fields: F,
    pub updated_at: DateTime<Utc>,
    pub etag: Option<String>,
    /// Soft-deleted on the remote side; only present when listing with
    /// `include_deleted_and_hidden`.
    pub deleted: bool,
}

/// Returned by a successful `create`.
#[derive(Debug, Clone)]
pub struct CreatedRemote {
    pub remote_id: String,
    pub etag: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Returned by a successful `update`.
#[derive(Debug, Clone)]
pub struct RemoteVersion {
    pub etag: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// One collection (tasks or events) on the remote task service.
///
/// The adapter is credential-agnostic: every call takes the bearer token and
/// nothing here refreshes or stores it.
#[async_trait]
pub trait RemoteCollection: Send + Sync {
    type Record: SyncRecord;

    async fn list(
        &self,
        credential: &str,
        include_deleted_and_hidden: bool,
    ) -> Result<Vec<RemoteRecord<FieldsOf<Self::Record>>>, AppError>;

    async fn create(
        &self,
        credential: &str,
        fields: &FieldsOf<Self::Record>,
        updated_at: DateTime<Utc>,
    ) -> Result<CreatedRemote, AppError>;

    /// Fails with `AppError::NotFound` when `remote_id` is unknown remotely.
    async fn update(
        &self,
        credential: &str,
        remote_id: &str,
        fields: &FieldsOf<Self::Record>,
        updated_at: DateTime<Utc>,
    ) -> Result<RemoteVersion, AppError>;

    async fn delete(&self, credential: &str, remote_id: &str) -> Result<(), AppError>;
}

/// HTTP implementation of one remote collection endpoint:
/// `GET url`, `POST url`, `PUT url/{id}`, `DELETE url/{id}`.
pub struct HttpRemote<R> {
    client: Client,
    url: String,
    _record: PhantomData<fn() -> R>,
}

impl<R> HttpRemote<R> {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            _record: PhantomData,
        }
    }
}

fn transport(err: reqwest::Error) -> AppError {
    AppError::RemoteUnavailable(err.to_string())
}

fn bad_shape(err: serde_json::Error) -> AppError {
    AppError::RemoteRejected(format!("unexpected response shape: {}", err))
}

/// Map the response status, returning the body text on success.
async fn read_body(response: Response) -> Result<String, AppError> {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::NOT_FOUND {
        return Err(AppError::NotFound);
    }
    if !status.is_success() {
        return Err(AppError::RemoteRejected(format!("{}: {}", status, body)));
    }
    Ok(body)
}

#[async_trait]
impl<R: SyncRecord> RemoteCollection for HttpRemote<R> {
    type Record = R;

    async fn list(
        &self,
        credential: &str,
        include_deleted_and_hidden: bool,
    ) -> Result<Vec<RemoteRecord<FieldsOf<R>>>, AppError> {
        let mut request = self.client.get(&self.url).bearer_auth(credential);
        if include_deleted_and_hidden {
            request = request.query(&[("showDeletedAndHidden", "true")]);
        }
        let response = request.send().await.map_err(transport)?;
        let body = read_body(response).await?;
        let parsed: dto::ListResponse<FieldsOf<R>> =
            serde_json::from_str(&body).map_err(bad_shape)?;
        Ok(parsed
            .items
            .into_iter()
            .map(|item| RemoteRecord {
                remote_id: item.id,
                fields: item.fields,
                updated_at: item.updated,
                etag: item.etag,
                deleted: item.deleted,
            })
            .collect())
    }

    async fn create(
        &self,
        credential: &str,
        fields: &FieldsOf<R>,
        updated_at: DateTime<Utc>,
    ) -> Result<CreatedRemote, AppError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(credential)
            .json(&dto::WriteItem {
                fields,
                updated: updated_at,
            })
            .send()
            .await
            .map_err(transport)?;
        let body = read_body(response).await?;
        let created: dto::CreatedDto = serde_json::from_str(&body).map_err(bad_shape)?;
        Ok(CreatedRemote {
            remote_id: created.id,
            etag: created.etag,
            updated_at: created.updated,
        })
    }

    async fn update(
        &self,
        credential: &str,
        remote_id: &str,
        fields: &FieldsOf<R>,
        updated_at: DateTime<Utc>,
    ) -> Result<RemoteVersion, AppError> {
        let url = format!("{}/{}", self.url, remote_id);
        let response = self
            .client
            .put(&url)
            .bearer_auth(credential)
            .json(&dto::WriteItem {
                fields,
                updated: updated_at,
            })
            .send()
            .await
            .map_err(transport)?;
        let body = read_body(response).await?;
        let version: dto::VersionDto = serde_json::from_str(&body).map_err(bad_shape)?;
        Ok(RemoteVersion {
            etag: version.etag,
            updated_at: version.updated,
        })
    }

    async fn delete(&self, credential: &str, remote_id: &str) -> Result<(), AppError> {
        let url = format!("{}/{}", self.url, remote_id);
        let response = self
            .client
            .delete(&url)
            .bearer_auth(credential)
            .send()
            .await
            .map_err(transport)?;
        read_body(response).await?;
        Ok(())
    }
}
