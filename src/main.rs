use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flem::models::{CalendarEvent, Task};
use flem::remote::HttpRemote;
use flem::services::{SyncScheduler, SyncService};
use flem::state::AppState;
use flem::storage::Storage;

const DEFAULT_REMOTE_URL: &str = "https://www.googleapis.com/tasks/v1/lists/@default";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "flem=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let data_dir = match std::env::var("FLEM_DATA_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("flem"),
    };

    let storage = Arc::new(Storage::new(&data_dir));
    storage.init().await?;

    let base_url =
        std::env::var("FLEM_REMOTE_URL").unwrap_or_else(|_| DEFAULT_REMOTE_URL.to_string());
    let client = reqwest::Client::builder().build()?;
    let tasks = Arc::new(HttpRemote::<Task>::new(
        client.clone(),
        format!("{}/tasks", base_url),
    ));
    let events = Arc::new(HttpRemote::<CalendarEvent>::new(
        client,
        format!("{}/events", base_url),
    ));
    let sync = Arc::new(SyncService::new(storage.clone(), tasks, events));

    let (mut state, degraded) = AppState::init(storage, sync).await;
    if degraded {
        warn!("stored document was unreadable; starting from an empty snapshot");
    }

    if let Ok(token) = std::env::var("FLEM_ACCESS_TOKEN") {
        let refresh = std::env::var("FLEM_REFRESH_TOKEN").ok();
        state.store.set_credential(Some(token), refresh).await?;
    }

    if let Ok(secs) = std::env::var("FLEM_SYNC_INTERVAL_SECS") {
        let interval: u64 = secs.parse()?;
        SyncScheduler::new(state, interval).start().await;
        return Ok(());
    }

    match state.sync_now().await {
        Ok(report) => {
            let stats = report.stats();
            info!(
                "sync completed: {} created, {} updated, {} deleted, {} materialized, {} purged, {} failed",
                stats.created,
                stats.updated,
                stats.deleted,
                stats.materialized,
                stats.purged,
                stats.failed
            );
            for failure in report.failures() {
                warn!("sync failed for '{}': {:?}", failure.title, failure.outcome);
            }
        }
        Err(err) => {
            warn!("sync failed: {}", err);
        }
    }

    Ok(())
}
