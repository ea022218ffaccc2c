//! Time-window burst suppression keyed by a logical channel identifier extracted from a
//! request's metadata or headers.

use crate::config::{BurstConfig, BurstMode};
use chrono::{DateTime, Utc};
use deliverymesh_core::{Clock, HeaderMap, SystemClock};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "metrics")]
use metrics::counter;

const METADATA_KEY_CANDIDATES: &[&str] = &["burst_key", "channel_id", "resource_id"];
const HEADER_KEY_CANDIDATES: &[&str] = &["x-goog-channel-id", "x-channel-id", "x-resource-id"];

/// The outcome of a [`BurstController::allow`] call.
#[derive(Debug, Clone)]
pub struct BurstDecision {
    pub allowed: bool,
    pub metadata: HashMap<String, String>,
}

impl BurstDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            metadata: HashMap::new(),
        }
    }
}

/// Extracts the burst key for a request: metadata candidates first, then header candidates.
/// Returns `None` when no candidate is present, in which case the caller is always allowed.
pub fn extract_burst_key(
    provider_id: &str,
    metadata: &HashMap<String, String>,
    headers: &HeaderMap,
) -> Option<String> {
    for candidate in METADATA_KEY_CANDIDATES {
        if let Some(value) = metadata.get(*candidate) {
            if !value.is_empty() {
                return Some(format!("{provider_id}:{value}"));
            }
        }
    }
    for candidate in HEADER_KEY_CANDIDATES {
        if let Some(value) = headers.get(candidate) {
            if !value.is_empty() {
                return Some(format!("{provider_id}:{value}"));
            }
        }
    }
    None
}

/// Coalesces or debounces bursts of requests sharing a logical channel key within a sliding
/// window. A single mutex guards the last-seen map; cleanup runs inline under the lock rather
/// than on a background timer, matching the store's no-background-worker policy.
pub struct BurstController<C: Clock = SystemClock> {
    last_seen: Mutex<HashMap<String, DateTime<Utc>>>,
    clock: Arc<C>,
    config: BurstConfig,
}

impl BurstController<SystemClock> {
    pub fn new(config: BurstConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }
}

impl<C: Clock> BurstController<C> {
    pub fn with_clock(config: BurstConfig, clock: Arc<C>) -> Self {
        Self {
            last_seen: Mutex::new(HashMap::new()),
            clock,
            config,
        }
    }

    /// Decides whether a request bearing `key` (from [`extract_burst_key`]) should be admitted.
    /// `key = None` always admits.
    pub fn allow(&self, key: Option<&str>) -> BurstDecision {
        let Some(key) = key else {
            return BurstDecision::allow();
        };
        if self.config.mode == BurstMode::None {
            return BurstDecision::allow();
        }

        let now = self.clock.now();
        let window = chrono::Duration::from_std(self.config.window).unwrap_or_default();
        let mut guard = self.last_seen.lock();

        let previous = guard.insert(key.to_string(), now);

        if guard.len() > self.config.max_entries {
            guard.retain(|_, seen_at| now - *seen_at < window);
        } else {
            // opportunistic cleanup even below the threshold, at four window-widths.
            let stale_horizon = window * 4;
            guard.retain(|_, seen_at| now - *seen_at < stale_horizon);
        }
        drop(guard);

        let suppress = previous.map(|last| now - last < window).unwrap_or(false);
        if !suppress {
            return BurstDecision::allow();
        }

        let mode_flag = match self.config.mode {
            BurstMode::Debounce => ("debounced", "true"),
            _ => ("coalesced", "true"),
        };
        let mut metadata = HashMap::new();
        metadata.insert(
            "burst_mode".to_string(),
            match self.config.mode {
                BurstMode::Debounce => "debounce".to_string(),
                _ => "coalesce".to_string(),
            },
        );
        metadata.insert("burst_key".to_string(), key.to_string());
        metadata.insert(
            "burst_window_ms".to_string(),
            self.config.window.as_millis().to_string(),
        );
        metadata.insert(mode_flag.0.to_string(), mode_flag.1.to_string());

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "deliverymesh_burst",
            key, "{}", deliverymesh_core::events::BURST_SUPPRESSED
        );
        #[cfg(feature = "metrics")]
        counter!("deliverymesh_burst_suppressed_total").increment(1);

        BurstDecision {
            allowed: false,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deliverymesh_core::FixedClock;
    use std::time::Duration;

    fn controller(mode: BurstMode) -> (BurstController<FixedClock>, Arc<FixedClock>) {
        let clock = FixedClock::epoch();
        let config = BurstConfig::builder()
            .mode(mode)
            .window(Duration::from_millis(500))
            .build();
        (BurstController::with_clock(config, Arc::clone(&clock)), clock)
    }

    #[test]
    fn first_request_for_a_key_is_always_admitted() {
        let (controller, _clock) = controller(BurstMode::Coalesce);
        let decision = controller.allow(Some("p:chan1"));
        assert!(decision.allowed);
    }

    #[test]
    fn suppresses_within_window_then_admits_after() {
        let (controller, clock) = controller(BurstMode::Coalesce);
        assert!(controller.allow(Some("p:chan1")).allowed);

        let second = controller.allow(Some("p:chan1"));
        assert!(!second.allowed);
        assert_eq!(second.metadata.get("coalesced").map(String::as_str), Some("true"));

        clock.advance(chrono::Duration::milliseconds(500));
        assert!(controller.allow(Some("p:chan1")).allowed);
    }

    #[test]
    fn debounce_mode_flags_debounced_instead_of_coalesced() {
        let (controller, _clock) = controller(BurstMode::Debounce);
        controller.allow(Some("p:chan1"));
        let second = controller.allow(Some("p:chan1"));
        assert_eq!(second.metadata.get("debounced").map(String::as_str), Some("true"));
    }

    #[test]
    fn no_key_always_allows() {
        let (controller, _clock) = controller(BurstMode::Coalesce);
        assert!(controller.allow(None).allowed);
        assert!(controller.allow(None).allowed);
    }

    #[test]
    fn extract_key_prefers_metadata_over_headers() {
        let mut metadata = HashMap::new();
        metadata.insert("channel_id".to_string(), "c1".to_string());
        let mut headers = HeaderMap::new();
        headers.insert("X-Channel-Id", "header-c1");
        let key = extract_burst_key("github", &metadata, &headers).unwrap();
        assert_eq!(key, "github:c1");
    }
}
