//! The `SyncJob` record and its lifecycle states.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    Bootstrap,
    Backfill,
    Incremental,
}

impl SyncMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncMode::Bootstrap => "bootstrap",
            SyncMode::Backfill => "backfill",
            SyncMode::Incremental => "incremental",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone)]
pub struct SyncJob {
    pub id: String,
    pub connection_id: String,
    pub provider_id: String,
    pub mode: SyncMode,
    pub status: SyncStatus,
    pub attempts: u32,
    pub checkpoint: Option<String>,
    pub next_attempt_at: Option<DateTime<Utc>>,
    pub metadata: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
