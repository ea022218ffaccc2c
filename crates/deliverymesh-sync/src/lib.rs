//! Bulk-sync job lifecycle and checkpoint durability: bootstrap/backfill/incremental crawls
//! that survive a crash by persisting their cursor through a [`SyncCursorStore`].

pub mod cursor;
pub mod job;
pub mod orchestrator;

pub use cursor::{InMemorySyncCursorStore, SyncCursorStore};
pub use job::{SyncJob, SyncMode, SyncStatus};
pub use orchestrator::{StartRequest, SyncOrchestrator};
