//! Configuration for [`crate::RetryPolicy`].

use std::time::Duration;

/// Tunables for exponential backoff: `delay = min(initial * 2^(attempt-1), max)`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicyConfig {
    pub(crate) initial: Duration,
    pub(crate) max: Duration,
    pub(crate) max_attempts: u32,
}

impl RetryPolicyConfig {
    pub fn builder() -> RetryPolicyConfigBuilder {
        RetryPolicyConfigBuilder::new()
    }
}

/// Builder for [`RetryPolicyConfig`].
pub struct RetryPolicyConfigBuilder {
    initial: Duration,
    max: Duration,
    max_attempts: u32,
}

impl RetryPolicyConfigBuilder {
    pub fn new() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(60),
            max_attempts: 8,
        }
    }

    /// Delay before the first retry. Default: 1s.
    pub fn initial(mut self, initial: Duration) -> Self {
        self.initial = initial;
        self
    }

    /// Ceiling the doubled delay saturates at. Default: 60s.
    pub fn max(mut self, max: Duration) -> Self {
        self.max = max;
        self
    }

    /// Attempts allowed before a delivery is dead-lettered. Default: 8.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn build(self) -> RetryPolicyConfig {
        RetryPolicyConfig {
            initial: self.initial,
            max: self.max,
            max_attempts: self.max_attempts,
        }
    }
}

impl Default for RetryPolicyConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
