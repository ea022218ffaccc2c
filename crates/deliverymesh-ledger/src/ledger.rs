//! `DeliveryLedger`: claim semantics identical to the generic claim store (absent -> processing,
//! steal on expired lease, dedupe window on a completed entry) plus attempt-bounded
//! dead-lettering specific to webhook deliveries.

use crate::record::{DeliveryRecord, DeliveryStatus};
use chrono::{DateTime, Utc};
use deliverymesh_core::{Clock, MeshError, SystemClock};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "metrics")]
use metrics::counter;

/// Default per-provider tunables applied when a caller doesn't override them.
#[derive(Clone, Copy)]
pub struct LedgerDefaults {
    pub lease: Duration,
    pub max_attempts: u32,
}

impl Default for LedgerDefaults {
    fn default() -> Self {
        Self {
            lease: Duration::from_secs(30),
            max_attempts: 8,
        }
    }
}

/// Capability contract for a webhook delivery ledger.
pub trait DeliveryLedger: Send + Sync {
    fn claim(
        &self,
        provider_id: &str,
        delivery_id: &str,
        lease: Duration,
    ) -> Result<(DeliveryRecord, bool), MeshError>;

    fn get(&self, provider_id: &str, delivery_id: &str) -> Option<DeliveryRecord>;

    fn complete(&self, claim_id: &str) -> Result<(), MeshError>;

    fn fail(
        &self,
        claim_id: &str,
        cause: &str,
        next_attempt_at: DateTime<Utc>,
        max_attempts: u32,
    ) -> Result<(), MeshError>;
}

struct Inner {
    records: HashMap<String, DeliveryRecord>,
    claim_index: HashMap<String, String>,
}

/// The default in-memory [`DeliveryLedger`].
pub struct InMemoryDeliveryLedger<C: Clock = SystemClock> {
    inner: Mutex<Inner>,
    clock: Arc<C>,
    defaults: LedgerDefaults,
}

impl InMemoryDeliveryLedger<SystemClock> {
    pub fn new(defaults: LedgerDefaults) -> Self {
        Self::with_clock(defaults, Arc::new(SystemClock))
    }
}

impl<C: Clock> InMemoryDeliveryLedger<C> {
    pub fn with_clock(defaults: LedgerDefaults, clock: Arc<C>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                records: HashMap::new(),
                claim_index: HashMap::new(),
            }),
            clock,
            defaults,
        }
    }

    pub fn defaults(&self) -> LedgerDefaults {
        self.defaults
    }
}

impl<C: Clock> DeliveryLedger for InMemoryDeliveryLedger<C> {
    fn claim(
        &self,
        provider_id: &str,
        delivery_id: &str,
        lease: Duration,
    ) -> Result<(DeliveryRecord, bool), MeshError> {
        if provider_id.trim().is_empty() || delivery_id.trim().is_empty() {
            return Err(MeshError::bad_input("provider_id and delivery_id are required"));
        }
        let now = self.clock.now();
        let key = DeliveryRecord::key(provider_id, delivery_id);
        let mut guard = self.inner.lock();

        guard.records.retain(|_, record| {
            !(record.status == DeliveryStatus::Processed
                && record
                    .lease_expires_at
                    .map(|at| at <= now)
                    .unwrap_or(true))
        });

        let issue = |attempts: u32| -> DeliveryRecord {
            DeliveryRecord {
                id: uuid::Uuid::new_v4().to_string(),
                claim_id: uuid::Uuid::new_v4().to_string(),
                provider_id: provider_id.to_string(),
                delivery_id: delivery_id.to_string(),
                status: DeliveryStatus::Processing,
                attempts,
                next_attempt_at: None,
                created_at: now,
                updated_at: now,
                lease_expires_at: Some(now + chrono::Duration::from_std(lease).unwrap_or_default()),
                ttl: lease,
            }
        };

        let decision = match guard.records.get(&key).cloned() {
            None => Some(issue(1)),
            Some(existing) => match existing.status {
                DeliveryStatus::Dead => None,
                DeliveryStatus::Processed => {
                    let live = existing
                        .lease_expires_at
                        .map(|at| at > now)
                        .unwrap_or(false);
                    if live {
                        None
                    } else {
                        Some(issue(1))
                    }
                }
                DeliveryStatus::Processing => {
                    let live = existing
                        .lease_expires_at
                        .map(|at| at > now)
                        .unwrap_or(false);
                    if live {
                        None
                    } else {
                        guard.claim_index.remove(&existing.claim_id);
                        Some(issue(existing.attempts + 1))
                    }
                }
                DeliveryStatus::RetryReady | DeliveryStatus::Pending => {
                    let waiting = existing.next_attempt_at.map(|at| now < at).unwrap_or(false);
                    if waiting {
                        None
                    } else {
                        guard.claim_index.remove(&existing.claim_id);
                        Some(issue(existing.attempts + 1))
                    }
                }
            },
        };

        match decision {
            None => {
                let existing = guard.records.get(&key).cloned().expect("checked above");
                Ok((existing, false))
            }
            Some(record) => {
                guard
                    .claim_index
                    .insert(record.claim_id.clone(), key.clone());
                guard.records.insert(key, record.clone());
                #[cfg(feature = "metrics")]
                counter!("deliverymesh_ledger_claim_issued_total").increment(1);
                Ok((record, true))
            }
        }
    }

    fn get(&self, provider_id: &str, delivery_id: &str) -> Option<DeliveryRecord> {
        let key = DeliveryRecord::key(provider_id, delivery_id);
        self.inner.lock().records.get(&key).cloned()
    }

    fn complete(&self, claim_id: &str) -> Result<(), MeshError> {
        let now = self.clock.now();
        let mut guard = self.inner.lock();
        let Some(key) = guard.claim_index.get(claim_id).cloned() else {
            return Ok(());
        };
        let Some(record) = guard.records.get_mut(&key) else {
            return Ok(());
        };
        if record.claim_id != claim_id || record.status != DeliveryStatus::Processing {
            return Ok(());
        }
        record.status = DeliveryStatus::Processed;
        record.lease_expires_at = Some(now + chrono::Duration::from_std(record.ttl).unwrap_or_default());
        record.updated_at = now;
        #[cfg(feature = "metrics")]
        counter!("deliverymesh_ledger_processed_total").increment(1);
        Ok(())
    }

    fn fail(
        &self,
        claim_id: &str,
        _cause: &str,
        next_attempt_at: DateTime<Utc>,
        max_attempts: u32,
    ) -> Result<(), MeshError> {
        let now = self.clock.now();
        let mut guard = self.inner.lock();
        let Some(key) = guard.claim_index.get(claim_id).cloned() else {
            return Ok(());
        };
        let Some(record) = guard.records.get_mut(&key) else {
            return Ok(());
        };
        if record.claim_id != claim_id || record.status != DeliveryStatus::Processing {
            return Ok(());
        }
        record.updated_at = now;
        if record.attempts >= max_attempts {
            record.status = DeliveryStatus::Dead;
            record.next_attempt_at = None;
            #[cfg(feature = "tracing")]
            tracing::warn!(
                target: "deliverymesh_ledger",
                provider_id = %record.provider_id, delivery_id = %record.delivery_id,
                attempts = record.attempts, max_attempts,
                "{}", deliverymesh_core::events::DELIVERY_DEAD_LETTERED
            );
            #[cfg(feature = "metrics")]
            counter!("deliverymesh_ledger_dead_lettered_total").increment(1);
        } else {
            record.status = DeliveryStatus::RetryReady;
            record.next_attempt_at = Some(next_attempt_at.max(now));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deliverymesh_core::FixedClock;

    fn ledger() -> (InMemoryDeliveryLedger<FixedClock>, Arc<FixedClock>) {
        let clock = FixedClock::epoch();
        let ledger = InMemoryDeliveryLedger::with_clock(LedgerDefaults::default(), Arc::clone(&clock));
        (ledger, clock)
    }

    #[test]
    fn dead_letters_after_max_attempts() {
        let (ledger, clock) = ledger();
        let (record, accepted) = ledger.claim("github", "d1", Duration::from_secs(30)).unwrap();
        assert!(accepted);
        ledger.fail(&record.claim_id, "boom", clock.now(), 1).unwrap();

        let record = ledger.get("github", "d1").unwrap();
        assert_eq!(record.status, DeliveryStatus::Dead);

        // dead is terminal: retry attempts never reclaim it.
        let (_, accepted2) = ledger.claim("github", "d1", Duration::from_secs(30)).unwrap();
        assert!(!accepted2);
    }

    #[test]
    fn retry_ready_until_next_attempt_at() {
        let (ledger, clock) = ledger();
        let (record, _) = ledger.claim("github", "d1", Duration::from_secs(30)).unwrap();
        let next = clock.now() + chrono::Duration::seconds(10);
        ledger.fail(&record.claim_id, "boom", next, 8).unwrap();

        let (_, accepted) = ledger.claim("github", "d1", Duration::from_secs(30)).unwrap();
        assert!(!accepted);

        clock.advance(chrono::Duration::seconds(11));
        let (record2, accepted2) = ledger.claim("github", "d1", Duration::from_secs(30)).unwrap();
        assert!(accepted2);
        assert_eq!(record2.attempts, 2);
    }

    #[test]
    fn processed_dedupes_within_ttl() {
        let (ledger, clock) = ledger();
        let (record, _) = ledger.claim("github", "d1", Duration::from_secs(60)).unwrap();
        ledger.complete(&record.claim_id).unwrap();

        let (_, accepted) = ledger.claim("github", "d1", Duration::from_secs(60)).unwrap();
        assert!(!accepted);

        clock.advance(chrono::Duration::seconds(61));
        let (_, accepted2) = ledger.claim("github", "d1", Duration::from_secs(60)).unwrap();
        assert!(accepted2);
    }
}
