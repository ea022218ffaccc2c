//! Adaptive backoff tunables: `delay = min(initial * 2^(attempts-1), max)`, same shape as the
//! webhook processor's retry policy but applied to throttle windows instead of retry windows.

use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub(crate) initial_backoff: Duration,
    pub(crate) max_backoff: Duration,
}

impl RateLimitConfig {
    pub fn builder() -> RateLimitConfigBuilder {
        RateLimitConfigBuilder::new()
    }
}

pub struct RateLimitConfigBuilder {
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl RateLimitConfigBuilder {
    pub fn new() -> Self {
        Self {
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
        }
    }

    /// Backoff used on the first observed throttle with no `Retry-After`. Default: 1s.
    pub fn initial_backoff(mut self, initial: Duration) -> Self {
        self.initial_backoff = initial;
        self
    }

    /// Ceiling the doubled backoff saturates at. Default: 60s.
    pub fn max_backoff(mut self, max: Duration) -> Self {
        self.max_backoff = max;
        self
    }

    pub fn build(self) -> RateLimitConfig {
        RateLimitConfig {
            initial_backoff: self.initial_backoff,
            max_backoff: self.max_backoff,
        }
    }
}

impl Default for RateLimitConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `attempts=0` (and `attempts=1`) return `initial`; each further attempt doubles up to `max`.
pub fn next_backoff(config: &RateLimitConfig, attempts: u32) -> Duration {
    let exponent = attempts.saturating_sub(1);
    let initial_nanos = config.initial_backoff.as_nanos();
    let scaled = 1u128
        .checked_shl(exponent.min(127))
        .unwrap_or(u128::MAX)
        .checked_mul(initial_nanos)
        .unwrap_or(u128::MAX);
    let max_nanos = config.max_backoff.as_nanos();
    Duration::from_nanos(scaled.min(max_nanos).min(u64::MAX as u128) as u64)
}
