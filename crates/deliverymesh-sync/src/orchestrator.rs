//! The bulk-sync orchestrator: job creation, checkpoint persistence, and resumption, backed by
//! an injectable [`SyncCursorStore`] for seeding a fresh job's checkpoint from the last
//! durable cursor.

use crate::cursor::SyncCursorStore;
use crate::job::{SyncJob, SyncMode, SyncStatus};
use chrono::{DateTime, Utc};
use deliverymesh_core::{Clock, MeshError, SystemClock};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "metrics")]
use metrics::counter;

/// Inputs common to every job-start operation.
pub struct StartRequest {
    pub connection_id: String,
    pub provider_id: String,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl StartRequest {
    pub fn new(connection_id: impl Into<String>, provider_id: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
            provider_id: provider_id.into(),
            resource_type: None,
            resource_id: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_resource(mut self, resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.into());
        self
    }
}

pub struct SyncOrchestrator<C: Clock = SystemClock> {
    jobs: Mutex<HashMap<String, SyncJob>>,
    clock: Arc<C>,
    cursor_store: Option<Arc<dyn SyncCursorStore>>,
}

impl SyncOrchestrator<SystemClock> {
    pub fn new(cursor_store: Option<Arc<dyn SyncCursorStore>>) -> Self {
        Self::with_clock(cursor_store, Arc::new(SystemClock))
    }
}

impl<C: Clock> SyncOrchestrator<C> {
    pub fn with_clock(cursor_store: Option<Arc<dyn SyncCursorStore>>, clock: Arc<C>) -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            clock,
            cursor_store,
        }
    }

    pub fn start_bootstrap(&self, req: StartRequest) -> SyncJob {
        self.start(SyncMode::Bootstrap, req)
    }

    pub fn start_incremental(&self, req: StartRequest) -> SyncJob {
        self.start(SyncMode::Incremental, req)
    }

    pub fn start_backfill(&self, req: StartRequest, from: DateTime<Utc>, to: DateTime<Utc>) -> SyncJob {
        let mut req = req;
        req.metadata.insert("from".to_string(), rfc3339_nanos(from));
        req.metadata.insert("to".to_string(), rfc3339_nanos(to));
        self.start(SyncMode::Backfill, req)
    }

    fn start(&self, mode: SyncMode, req: StartRequest) -> SyncJob {
        let now = self.clock.now();
        let mut metadata = req.metadata;

        let checkpoint = match (&req.resource_type, &req.resource_id, &self.cursor_store) {
            (Some(resource_type), Some(resource_id), Some(store)) => {
                metadata.insert("resource_type".to_string(), resource_type.clone());
                metadata.insert("resource_id".to_string(), resource_id.clone());
                store.get(&req.connection_id, resource_type, resource_id)
            }
            (Some(resource_type), Some(resource_id), None) => {
                metadata.insert("resource_type".to_string(), resource_type.clone());
                metadata.insert("resource_id".to_string(), resource_id.clone());
                None
            }
            _ => None,
        };

        let job = SyncJob {
            id: uuid::Uuid::new_v4().to_string(),
            connection_id: req.connection_id,
            provider_id: req.provider_id,
            mode,
            status: SyncStatus::Queued,
            attempts: 0,
            checkpoint,
            next_attempt_at: None,
            metadata,
            created_at: now,
            updated_at: now,
        };

        self.jobs.lock().insert(job.id.clone(), job.clone());
        #[cfg(feature = "metrics")]
        counter!("deliverymesh_sync_job_started_total", "mode" => mode.as_str()).increment(1);
        job
    }

    pub fn get(&self, id: &str) -> Option<SyncJob> {
        self.jobs.lock().get(id).cloned()
    }

    /// Persists a new checkpoint and metadata merge (new keys override existing ones),
    /// transitioning the job to `running`.
    pub fn save_checkpoint(
        &self,
        id: &str,
        checkpoint: String,
        metadata: HashMap<String, String>,
    ) -> Result<SyncJob, MeshError> {
        let now = self.clock.now();
        let mut guard = self.jobs.lock();
        let job = guard
            .get_mut(id)
            .ok_or_else(|| MeshError::not_found(format!("sync job not found: {id}")))?;
        job.checkpoint = Some(checkpoint);
        job.status = SyncStatus::Running;
        for (k, v) in metadata {
            job.metadata.insert(k, v);
        }
        job.updated_at = now;
        Ok(job.clone())
    }

    /// Applies [`save_checkpoint`](Self::save_checkpoint) then marks the job `succeeded`.
    pub fn complete(
        &self,
        id: &str,
        checkpoint: String,
        metadata: HashMap<String, String>,
    ) -> Result<SyncJob, MeshError> {
        self.save_checkpoint(id, checkpoint, metadata)?;
        let now = self.clock.now();
        let mut guard = self.jobs.lock();
        let job = guard
            .get_mut(id)
            .ok_or_else(|| MeshError::not_found(format!("sync job not found: {id}")))?;
        job.status = SyncStatus::Succeeded;
        job.updated_at = now;
        #[cfg(feature = "metrics")]
        counter!("deliverymesh_sync_job_succeeded_total").increment(1);
        Ok(job.clone())
    }

    pub fn fail(
        &self,
        id: &str,
        cause: &str,
        next_attempt_at: Option<DateTime<Utc>>,
    ) -> Result<SyncJob, MeshError> {
        let now = self.clock.now();
        let mut guard = self.jobs.lock();
        let job = guard
            .get_mut(id)
            .ok_or_else(|| MeshError::not_found(format!("sync job not found: {id}")))?;
        job.status = SyncStatus::Failed;
        job.attempts += 1;
        job.metadata.insert("last_error".to_string(), cause.to_string());
        job.next_attempt_at = next_attempt_at;
        job.updated_at = now;
        #[cfg(feature = "tracing")]
        tracing::warn!(
            target: "deliverymesh_sync",
            job_id = %id, attempts = job.attempts, "{}", deliverymesh_core::events::SYNC_JOB_FAILED
        );
        Ok(job.clone())
    }

    /// No-ops on a `succeeded` job. Otherwise moves a `failed` job back to `queued`, then
    /// increments `attempts` and persists regardless of the job's prior status.
    pub fn resume(&self, id: &str) -> Result<SyncJob, MeshError> {
        let now = self.clock.now();
        let mut guard = self.jobs.lock();
        let job = guard
            .get_mut(id)
            .ok_or_else(|| MeshError::not_found(format!("sync job not found: {id}")))?;
        if job.status == SyncStatus::Succeeded {
            return Ok(job.clone());
        }
        if job.status == SyncStatus::Failed {
            job.status = SyncStatus::Queued;
        }
        job.attempts += 1;
        job.updated_at = now;
        Ok(job.clone())
    }
}

fn rfc3339_nanos(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true)
}
