//! `RateLimitState`: the observed throttle state for one bucket.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

/// State tracked per [`crate::RateLimitKey`]. Optional fields are genuinely absent, not
/// sentinel zero values, per the nullable-timestamp design note.
#[derive(Debug, Clone, Default)]
pub struct RateLimitState {
    pub limit: Option<i64>,
    pub remaining: Option<i64>,
    pub reset_at: Option<DateTime<Utc>>,
    pub retry_after: Option<Duration>,
    pub throttled_until: Option<DateTime<Utc>>,
    pub last_status: Option<u16>,
    pub attempts: u32,
    pub updated_at: Option<DateTime<Utc>>,
    pub metadata: HashMap<String, String>,
}

impl RateLimitState {
    pub fn is_throttled_at(&self, now: DateTime<Utc>) -> bool {
        self.throttled_until.map(|at| at > now).unwrap_or(false)
    }
}
