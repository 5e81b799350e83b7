use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("no credential configured")]
    CredentialMissing,

    #[error("a sync pass is already running")]
    SyncInProgress,

    #[error("remote unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("remote rejected request: {0}")]
    RemoteRejected(String),

    #[error("not found")]
    NotFound,

    #[error("stored document unreadable: {0}")]
    PersistenceCorrupt(String),

    #[error("failed to write snapshot: {0}")]
    PersistenceWriteFailed(#[from] std::io::Error),
}
