use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::models::Snapshot;

pub const DB_FILENAME: &str = "flem_db.json";

/// Outcome of loading the persisted document. `degraded` is set when the
/// document was missing or unreadable and the default snapshot was substituted.
#[derive(Debug)]
pub struct LoadOutcome {
    pub snapshot: Snapshot,
    pub degraded: bool,
}

/// Persistence adapter: one JSON document, replaced whole on every save.
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(DB_FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the data directory and a default document if none exists yet,
    /// so a missing file at load time means something actually went wrong.
    pub async fn init(&self) -> Result<(), AppError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).await?;
        }
        if fs::try_exists(&self.path).await? {
            return Ok(());
        }
        self.save(&Snapshot::default()).await
    }

    /// Load the document. Never fails: a missing or corrupt document yields
    /// the default empty snapshot with `degraded` set.
    pub async fn load(&self) -> LoadOutcome {
        match self.read_document().await {
            Ok(snapshot) => LoadOutcome {
                snapshot,
                degraded: false,
            },
            Err(err) => {
                warn!("loading {} failed, starting from empty: {}", self.path.display(), err);
                LoadOutcome {
                    snapshot: Snapshot::default(),
                    degraded: true,
                }
            }
        }
    }

    async fn read_document(&self) -> Result<Snapshot, AppError> {
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| AppError::PersistenceCorrupt(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| AppError::PersistenceCorrupt(e.to_string()))
    }

    /// Atomic whole-document replace: write a sibling temp file, then rename
    /// over the previous document. A failed save leaves the old file intact.
    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), AppError> {
        let bytes = serde_json::to_vec_pretty(snapshot).map_err(io::Error::from)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!("saved snapshot to {}", self.path.display());
        Ok(())
    }
}
