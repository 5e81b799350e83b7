pub mod scheduler;
pub mod sync_service;

pub use scheduler::SyncScheduler;
pub use sync_service::{RecordOutcome, SyncOutcome, SyncReport, SyncService, SyncStats};
