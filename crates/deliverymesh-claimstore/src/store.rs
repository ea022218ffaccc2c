//! The claim lifecycle: `absent -> processing -> {complete | retry_ready}`, with lease-based
//! theft and a dedupe window enforced by a live `lease_expires_at` on a completed entry.

use crate::config::ClaimStoreConfig;
use chrono::{DateTime, Utc};
use deliverymesh_core::{Clock, MeshError, SystemClock};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "metrics")]
use metrics::counter;

/// Closed set of states a claim entry can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimStatus {
    Processing,
    RetryReady,
    Complete,
}

/// A single keyed claim record.
#[derive(Debug, Clone)]
pub struct ClaimEntry {
    pub key: String,
    pub status: ClaimStatus,
    pub claim_id: String,
    pub attempts: u32,
    pub lease_expires_at: Option<DateTime<Utc>>,
    pub retry_at: Option<DateTime<Utc>>,
    ttl: Duration,
}

/// Capability contract for a claim backend: keyed, leased, exclusive ownership.
pub trait ClaimStore: Send + Sync {
    /// Attempts to claim `key` with `lease`. Returns `(claim_id, accepted)`.
    fn claim(&self, key: &str, lease: Duration) -> Result<(String, bool), MeshError>;
    /// Transitions the currently-owned processing claim to complete.
    fn complete(&self, claim_id: &str) -> Result<(), MeshError>;
    /// Transitions the currently-owned processing claim to retry-ready.
    fn fail(&self, claim_id: &str, cause: &str, retry_at: DateTime<Utc>) -> Result<(), MeshError>;
}

struct Inner {
    entries: HashMap<String, ClaimEntry>,
    claim_index: HashMap<String, String>,
}

/// The default in-memory [`ClaimStore`], guarded by a single mutex per the store's
/// shared-resource policy: critical sections never make outbound calls and are held only for
/// the duration of a state transition.
pub struct InMemoryClaimStore<C: Clock = SystemClock> {
    inner: Mutex<Inner>,
    clock: Arc<C>,
    config: ClaimStoreConfig,
}

impl InMemoryClaimStore<SystemClock> {
    pub fn new(config: ClaimStoreConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }
}

impl<C: Clock> InMemoryClaimStore<C> {
    pub fn with_clock(config: ClaimStoreConfig, clock: Arc<C>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                claim_index: HashMap::new(),
            }),
            clock,
            config,
        }
    }

    /// Reads the current entry for `key`, if any. Used by callers (the webhook ledger, tests)
    /// that need to inspect status without mutating it.
    pub fn peek(&self, key: &str) -> Option<ClaimEntry> {
        self.inner.lock().entries.get(key).cloned()
    }

    fn new_claim_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

impl<C: Clock> ClaimStore for InMemoryClaimStore<C> {
    fn claim(&self, key: &str, lease: Duration) -> Result<(String, bool), MeshError> {
        if key.trim().is_empty() {
            return Err(MeshError::bad_input("claim key must not be empty"));
        }
        let now = self.clock.now();
        let mut guard = self.inner.lock();

        let expired_claim_ids: Vec<String> = guard
            .entries
            .values()
            .filter(|entry| {
                entry.status == ClaimStatus::Complete
                    && entry.lease_expires_at.map(|at| at <= now).unwrap_or(true)
            })
            .map(|entry| entry.claim_id.clone())
            .collect();
        guard.entries.retain(|_, entry| {
            !(entry.status == ClaimStatus::Complete
                && entry.lease_expires_at.map(|at| at <= now).unwrap_or(true))
        });
        for claim_id in expired_claim_ids {
            guard.claim_index.remove(&claim_id);
        }

        let issue = |attempts: u32| -> (String, ClaimEntry) {
            let claim_id = Self::new_claim_id();
            let entry = ClaimEntry {
                key: key.to_string(),
                status: ClaimStatus::Processing,
                claim_id: claim_id.clone(),
                attempts,
                lease_expires_at: Some(now + chrono::Duration::from_std(lease).unwrap_or_default()),
                retry_at: None,
                ttl: lease,
            };
            (claim_id, entry)
        };

        let decision = match guard.entries.get(key).cloned() {
            None => Some(issue(1)),
            Some(existing) => match existing.status {
                ClaimStatus::Complete => {
                    let live = existing.lease_expires_at.map(|at| at > now).unwrap_or(false);
                    if live {
                        None
                    } else {
                        Some(issue(1))
                    }
                }
                ClaimStatus::Processing => {
                    let live = existing.lease_expires_at.map(|at| at > now).unwrap_or(false);
                    if live {
                        None
                    } else {
                        guard.claim_index.remove(&existing.claim_id);
                        Some(issue(existing.attempts + 1))
                    }
                }
                ClaimStatus::RetryReady => {
                    let waiting = existing.retry_at.map(|at| now < at).unwrap_or(false);
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
            None => Ok((String::new(), false)),
            Some((claim_id, entry)) => {
                guard.claim_index.insert(claim_id.clone(), key.to_string());
                guard.entries.insert(key.to_string(), entry);
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    target: "deliverymesh_claimstore",
                    key, claim_id = %claim_id, store = %self.config.name,
                    "{}", deliverymesh_core::events::CLAIM_ISSUED
                );
                #[cfg(feature = "metrics")]
                counter!("deliverymesh_claim_issued_total", "store" => self.config.name.clone())
                    .increment(1);
                Ok((claim_id, true))
            }
        }
    }

    fn complete(&self, claim_id: &str) -> Result<(), MeshError> {
        let now = self.clock.now();
        let mut guard = self.inner.lock();
        let Some(key) = guard.claim_index.get(claim_id).cloned() else {
            return Ok(());
        };
        let Some(entry) = guard.entries.get_mut(&key) else {
            return Ok(());
        };
        if entry.claim_id != claim_id || entry.status != ClaimStatus::Processing {
            return Ok(());
        }
        entry.status = ClaimStatus::Complete;
        entry.lease_expires_at = Some(now + chrono::Duration::from_std(entry.ttl).unwrap_or_default());
        entry.retry_at = None;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "deliverymesh_claimstore",
            claim_id, store = %self.config.name,
            "{}", deliverymesh_core::events::CLAIM_COMPLETED
        );
        #[cfg(feature = "metrics")]
        counter!("deliverymesh_claim_completed_total", "store" => self.config.name.clone())
            .increment(1);
        Ok(())
    }

    fn fail(&self, claim_id: &str, _cause: &str, retry_at: DateTime<Utc>) -> Result<(), MeshError> {
        let now = self.clock.now();
        let mut guard = self.inner.lock();
        let Some(key) = guard.claim_index.get(claim_id).cloned() else {
            return Ok(());
        };
        let Some(entry) = guard.entries.get_mut(&key) else {
            return Ok(());
        };
        if entry.claim_id != claim_id || entry.status != ClaimStatus::Processing {
            return Ok(());
        }
        entry.status = ClaimStatus::RetryReady;
        entry.retry_at = Some(retry_at.max(now));
        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "deliverymesh_claimstore",
            claim_id, store = %self.config.name,
            "{}", deliverymesh_core::events::CLAIM_FAILED
        );
        #[cfg(feature = "metrics")]
        counter!("deliverymesh_claim_failed_total", "store" => self.config.name.clone())
            .increment(1);
        Ok(())
    }
}
