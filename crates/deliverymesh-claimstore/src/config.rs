//! Configuration for an in-memory claim store.

use std::time::Duration;

/// Tunables for [`crate::InMemoryClaimStore`].
#[derive(Clone)]
pub struct ClaimStoreConfig {
    pub(crate) default_lease: Duration,
    pub(crate) name: String,
}

impl ClaimStoreConfig {
    pub fn builder() -> ClaimStoreConfigBuilder {
        ClaimStoreConfigBuilder::new()
    }
}

/// Builder for [`ClaimStoreConfig`].
pub struct ClaimStoreConfigBuilder {
    default_lease: Duration,
    name: String,
}

impl ClaimStoreConfigBuilder {
    pub fn new() -> Self {
        Self {
            default_lease: Duration::from_secs(30),
            name: "claimstore".to_string(),
        }
    }

    /// Lease duration used when a caller claims without specifying one explicitly.
    ///
    /// Default: 30s.
    pub fn default_lease(mut self, lease: Duration) -> Self {
        self.default_lease = lease;
        self
    }

    /// Name of this store instance, used in log/metric labels.
    ///
    /// Default: "claimstore".
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn build(self) -> ClaimStoreConfig {
        ClaimStoreConfig {
            default_lease: self.default_lease,
            name: self.name,
        }
    }
}

impl Default for ClaimStoreConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
