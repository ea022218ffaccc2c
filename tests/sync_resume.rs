//! S7 (Sync resume): start incremental, save a checkpoint, fail with a scheduled retry time,
//! then resume — the job comes back `queued` with the checkpoint intact and attempts bumped.

use deliverymesh_core::{Clock, FixedClock};
use deliverymesh_sync::{StartRequest, SyncOrchestrator, SyncStatus};
use std::collections::HashMap;

#[test]
fn failed_incremental_job_resumes_to_queued_with_checkpoint_preserved() {
    let clock = FixedClock::epoch();
    let orchestrator = SyncOrchestrator::with_clock(None, clock.clone());

    let req = StartRequest::new("conn-1", "shopify");
    let job = orchestrator.start_incremental(req);
    assert_eq!(job.status, SyncStatus::Queued);

    orchestrator
        .save_checkpoint(&job.id, "cursor_2".to_string(), HashMap::new())
        .unwrap();

    let next_attempt_at = clock.now() + chrono::Duration::seconds(30);
    orchestrator.fail(&job.id, "upstream 500", Some(next_attempt_at)).unwrap();

    let resumed = orchestrator.resume(&job.id).unwrap();
    assert_eq!(resumed.status, SyncStatus::Queued);
    assert_eq!(resumed.checkpoint.as_deref(), Some("cursor_2"));
    assert_eq!(resumed.attempts, 2);
}
