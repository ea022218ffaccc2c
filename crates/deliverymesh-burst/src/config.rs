//! Configuration for the burst controller.

use std::time::Duration;

/// Controller-wide suppression mode. `Coalesce` and `Debounce` differ only in the metadata flag
/// emitted on suppression; `None` disables suppression entirely (every request is admitted).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstMode {
    None,
    Coalesce,
    Debounce,
}

/// Tunables for [`crate::BurstController`].
#[derive(Clone)]
pub struct BurstConfig {
    pub(crate) mode: BurstMode,
    pub(crate) window: Duration,
    pub(crate) max_entries: usize,
}

impl BurstConfig {
    pub fn builder() -> BurstConfigBuilder {
        BurstConfigBuilder::new()
    }
}

/// Builder for [`BurstConfig`].
pub struct BurstConfigBuilder {
    mode: BurstMode,
    window: Duration,
    max_entries: usize,
}

impl BurstConfigBuilder {
    pub fn new() -> Self {
        Self {
            mode: BurstMode::Coalesce,
            window: Duration::from_millis(500),
            max_entries: 10_000,
        }
    }

    /// Default: [`BurstMode::Coalesce`].
    pub fn mode(mut self, mode: BurstMode) -> Self {
        self.mode = mode;
        self
    }

    /// Suppression window. Default: 500ms.
    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Cleanup threshold: once the tracked-key map exceeds this size, entries older than
    /// `window` are evicted. Default: 10,000.
    pub fn max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn build(self) -> BurstConfig {
        BurstConfig {
            mode: self.mode,
            window: self.window,
            max_entries: self.max_entries,
        }
    }
}

impl Default for BurstConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
