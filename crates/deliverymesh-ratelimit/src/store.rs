//! `RateLimitStateStore`: the single-mutex, keyed backend `BeforeCall`/`AfterCall` read and
//! write through.

use crate::key::RateLimitKey;
use crate::state::RateLimitState;
use deliverymesh_core::MeshError;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Capability contract for a rate-limit state backend.
pub trait RateLimitStateStore: Send + Sync {
    /// Returns `Err` with [`MeshError::state_not_found`] when the key has never been observed.
    fn get(&self, key: &RateLimitKey) -> Result<RateLimitState, MeshError>;
    fn upsert(&self, key: &RateLimitKey, state: RateLimitState) -> Result<(), MeshError>;
}

/// The default in-memory [`RateLimitStateStore`].
#[derive(Default)]
pub struct InMemoryRateLimitStateStore {
    inner: Mutex<HashMap<String, RateLimitState>>,
}

impl InMemoryRateLimitStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateLimitStateStore for InMemoryRateLimitStateStore {
    fn get(&self, key: &RateLimitKey) -> Result<RateLimitState, MeshError> {
        self.inner
            .lock()
            .get(&key.as_storage_key())
            .cloned()
            .ok_or_else(|| MeshError::state_not_found(key))
    }

    fn upsert(&self, key: &RateLimitKey, state: RateLimitState) -> Result<(), MeshError> {
        self.inner.lock().insert(key.as_storage_key(), state);
        Ok(())
    }
}
