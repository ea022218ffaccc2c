//! Event-name vocabulary for tracing/metrics emission.
//!
//! Components call straight into `tracing`/`metrics` behind feature flags at each state
//! transition rather than dispatching through an event-listener bus. This module only holds
//! the shared event-name vocabulary so every crate logs matching labels instead of drifting.

pub const CLAIM_ISSUED: &str = "claim_issued";
pub const CLAIM_STOLEN: &str = "claim_stolen";
pub const CLAIM_REJECTED: &str = "claim_rejected";
pub const CLAIM_COMPLETED: &str = "claim_completed";
pub const CLAIM_FAILED: &str = "claim_failed";
pub const DELIVERY_DEAD_LETTERED: &str = "delivery_dead_lettered";
pub const BURST_SUPPRESSED: &str = "burst_suppressed";
pub const DISPATCH_DEDUPED: &str = "dispatch_deduped";
pub const RATE_LIMIT_THROTTLED: &str = "rate_limit_throttled";
pub const RATE_LIMIT_RESET: &str = "rate_limit_reset";
pub const TRANSPORT_RESPONSE_TOO_LARGE: &str = "transport_response_too_large";
pub const SYNC_JOB_FAILED: &str = "sync_job_failed";
pub const SYNC_JOB_RESUMED: &str = "sync_job_resumed";
