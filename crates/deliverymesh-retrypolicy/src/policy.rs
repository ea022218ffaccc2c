//! Exponential backoff: `delay = min(initial * 2^(attempt-1), max)`, saturating rather than
//! overflowing once the exponent grows past what `Duration` can hold.

use crate::config::RetryPolicyConfig;
use std::time::Duration;

/// The webhook processor's retry policy: how long to wait before the next attempt, and when
/// to give up entirely.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    config: RetryPolicyConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryPolicyConfig) -> Self {
        Self { config }
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    /// Delay before the attempt numbered `attempt` (1-indexed: `attempt=1` is the first retry).
    /// `attempt=0` is treated as `attempt=1` and returns `initial`.
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let initial_nanos = self.config.initial.as_nanos();
        let scaled = 1u128
            .checked_shl(exponent.min(127))
            .unwrap_or(u128::MAX)
            .checked_mul(initial_nanos)
            .unwrap_or(u128::MAX);
        let max_nanos = self.config.max.as_nanos();
        Duration::from_nanos(scaled.min(max_nanos).min(u64::MAX as u128) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(
            RetryPolicyConfig::builder()
                .initial(Duration::from_secs(1))
                .max(Duration::from_secs(60))
                .build(),
        )
    }

    #[test]
    fn first_attempt_returns_initial() {
        assert_eq!(policy().next_delay(1), Duration::from_secs(1));
        assert_eq!(policy().next_delay(0), Duration::from_secs(1));
    }

    #[test]
    fn doubles_each_attempt_until_capped() {
        let p = policy();
        assert_eq!(p.next_delay(2), Duration::from_secs(2));
        assert_eq!(p.next_delay(3), Duration::from_secs(4));
        assert_eq!(p.next_delay(7), Duration::from_secs(60));
        assert_eq!(p.next_delay(20), Duration::from_secs(60));
    }
}
