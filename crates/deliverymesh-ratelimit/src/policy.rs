//! The two-phase contract every outbound provider call consults: [`RateLimitPolicy::before_call`]
//! and [`RateLimitPolicy::after_call`].

use crate::config::{next_backoff, RateLimitConfig};
use crate::key::RateLimitKey;
use crate::response::{parse, ResponseObservation};
use crate::state::RateLimitState;
use crate::store::RateLimitStateStore;
use chrono::{DateTime, Utc};
use deliverymesh_core::{Clock, MeshError, SystemClock};
use std::sync::Arc;

#[cfg(feature = "metrics")]
use metrics::counter;

/// Adaptive rate-limit policy: observes provider response headers and throttles future
/// `before_call` checks for the same bucket.
pub struct RateLimitPolicy<S: RateLimitStateStore, C: Clock = SystemClock> {
    store: S,
    clock: Arc<C>,
    config: RateLimitConfig,
}

impl<S: RateLimitStateStore> RateLimitPolicy<S, SystemClock> {
    pub fn new(store: S, config: RateLimitConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }
}

impl<S: RateLimitStateStore, C: Clock> RateLimitPolicy<S, C> {
    pub fn with_clock(store: S, config: RateLimitConfig, clock: Arc<C>) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Refuses the call with a throttled [`MeshError`] when the bucket is known to be
    /// exhausted; allows (including on an absent state record) otherwise.
    pub fn before_call(&self, key: &RateLimitKey) -> Result<(), MeshError> {
        let now = self.clock.now();
        let state = match self.store.get(key) {
            Ok(state) => state,
            Err(err) if err.is_state_not_found() => return Ok(()),
            Err(err) => return Err(err),
        };

        if let Some(throttled_until) = state.throttled_until {
            if throttled_until > now {
                let retry_after = (throttled_until - now).to_std().unwrap_or_default();
                return Err(MeshError::throttled(retry_after)
                    .with_metadata("rate_limit_key", key.to_string()));
            }
        }

        if state.remaining == Some(0) {
            if let Some(reset_at) = state.reset_at {
                if reset_at > now {
                    let retry_after = (reset_at - now).to_std().unwrap_or_default();
                    return Err(MeshError::throttled(retry_after)
                        .with_metadata("rate_limit_key", key.to_string()));
                }
            }
        }

        Ok(())
    }

    /// Folds one observed response into the bucket's state, updating the throttle window used
    /// by future `before_call` checks.
    pub fn after_call(
        &self,
        key: &RateLimitKey,
        observation: &ResponseObservation,
    ) -> Result<(), MeshError> {
        let now = self.clock.now();
        let parsed = parse(observation, now);

        let mut state = match self.store.get(key) {
            Ok(state) => state,
            Err(err) if err.is_state_not_found() => RateLimitState::default(),
            Err(err) => return Err(err),
        };

        let any_signal = parsed.remaining.is_some()
            || parsed.reset_at.is_some()
            || parsed.limit.is_some()
            || parsed.retry_after.is_some();

        let throttled = if observation.status == 429 {
            true
        } else if observation.status >= 500 {
            false
        } else {
            parsed.remaining == Some(0) && any_signal
        };

        if let Some(limit) = parsed.limit {
            state.limit = Some(limit);
        }
        if let Some(remaining) = parsed.remaining {
            state.remaining = Some(remaining);
        }
        if let Some(reset_at) = parsed.reset_at {
            state.reset_at = Some(reset_at);
        }
        state.retry_after = parsed.retry_after;
        state.last_status = Some(observation.status);
        state.updated_at = Some(now);
        for (k, v) in observation.headers.iter() {
            state.metadata.insert(k.to_string(), v.to_string());
        }

        if throttled {
            state.attempts += 1;
            let backoff = parsed.retry_after.unwrap_or_else(|| next_backoff(&self.config, state.attempts));
            state.throttled_until = Some(now + chrono::Duration::from_std(backoff).unwrap_or_default());
            #[cfg(feature = "tracing")]
            tracing::warn!(
                target: "deliverymesh_ratelimit",
                key = %key, attempts = state.attempts,
                "{}", deliverymesh_core::events::RATE_LIMIT_THROTTLED
            );
            #[cfg(feature = "metrics")]
            counter!("deliverymesh_ratelimit_throttled_total").increment(1);
        } else {
            state.attempts = 0;
            state.throttled_until = None;
            #[cfg(feature = "tracing")]
            tracing::debug!(
                target: "deliverymesh_ratelimit",
                key = %key,
                "{}", deliverymesh_core::events::RATE_LIMIT_RESET
            );
        }

        self.store.upsert(key, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::ResponseObservation;
    use crate::store::InMemoryRateLimitStateStore;
    use deliverymesh_core::{FixedClock, HeaderMap};
    use std::time::Duration;

    fn policy() -> (
        RateLimitPolicy<InMemoryRateLimitStateStore, FixedClock>,
        Arc<FixedClock>,
    ) {
        let clock = FixedClock::epoch();
        let config = RateLimitConfig::builder()
            .initial_backoff(Duration::from_secs(2))
            .max_backoff(Duration::from_secs(30))
            .build();
        (
            RateLimitPolicy::with_clock(InMemoryRateLimitStateStore::new(), config, Arc::clone(&clock)),
            clock,
        )
    }

    #[test]
    fn absent_state_always_allows() {
        let (policy, _clock) = policy();
        let key = RateLimitKey::new("github", "repo", "acme/widgets", "core");
        assert!(policy.before_call(&key).is_ok());
    }

    #[test]
    fn retry_after_seconds_sets_throttle_window() {
        let (policy, clock) = policy();
        let key = RateLimitKey::new("shopify", "shop", "acme", "rest");
        let mut headers = HeaderMap::new();
        headers.insert("Retry-After", "10");
        policy
            .after_call(
                &key,
                &ResponseObservation {
                    status: 429,
                    headers,
                    body_retry_after: None,
                },
            )
            .unwrap();

        clock.advance(chrono::Duration::seconds(5));
        let err = policy.before_call(&key).unwrap_err();
        assert!(err.is_throttled());
        let retry_after = err.retry_after().unwrap();
        assert!(retry_after <= Duration::from_secs(5) && retry_after > Duration::from_secs(4));
    }

    #[test]
    fn two_consecutive_429s_with_no_retry_after_use_adaptive_backoff() {
        let (policy, _clock) = policy();
        let key = RateLimitKey::new("shopify", "shop", "acme", "rest");
        for _ in 0..2 {
            policy
                .after_call(
                    &key,
                    &ResponseObservation {
                        status: 429,
                        headers: HeaderMap::new(),
                        body_retry_after: None,
                    },
                )
                .unwrap();
        }
        let err = policy.before_call(&key).unwrap_err();
        let retry_after = err.retry_after().unwrap();
        assert!(retry_after <= Duration::from_secs(4) && retry_after > Duration::from_secs(3));
    }

    #[test]
    fn non_throttled_response_resets_attempts() {
        let (policy, _clock) = policy();
        let key = RateLimitKey::new("shopify", "shop", "acme", "rest");
        policy
            .after_call(
                &key,
                &ResponseObservation {
                    status: 429,
                    headers: HeaderMap::new(),
                    body_retry_after: None,
                },
            )
            .unwrap();
        policy
            .after_call(
                &key,
                &ResponseObservation {
                    status: 200,
                    headers: HeaderMap::new(),
                    body_retry_after: None,
                },
            )
            .unwrap();
        assert!(policy.before_call(&key).is_ok());
    }

    #[test]
    fn server_error_is_never_treated_as_throttled() {
        let (policy, _clock) = policy();
        let key = RateLimitKey::new("shopify", "shop", "acme", "rest");
        let mut headers = HeaderMap::new();
        headers.insert("X-RateLimit-Remaining", "0");
        policy
            .after_call(
                &key,
                &ResponseObservation {
                    status: 503,
                    headers,
                    body_retry_after: None,
                },
            )
            .unwrap();
        assert!(policy.before_call(&key).is_ok());
    }
}
