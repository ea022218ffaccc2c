//! The delivery record: a claim store specialized to `(provider_id, delivery_id)`.

use chrono::{DateTime, Utc};

/// Closed set of states a delivery record can be in. `Processed` and `Dead` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Pending,
    Processing,
    Processed,
    RetryReady,
    Dead,
}

/// A single webhook delivery, tracked through to completion or dead-letter.
#[derive(Debug, Clone)]
pub struct DeliveryRecord {
    pub id: String,
    pub claim_id: String,
    pub provider_id: String,
    pub delivery_id: String,
    pub status: DeliveryStatus,
    pub attempts: u32,
    pub next_attempt_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub(crate) lease_expires_at: Option<DateTime<Utc>>,
    pub(crate) ttl: std::time::Duration,
}

impl DeliveryRecord {
    pub fn key(provider_id: &str, delivery_id: &str) -> String {
        format!("{provider_id}\u{0}{delivery_id}")
    }
}
