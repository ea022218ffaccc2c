//! Coalesces or debounces bursts of inbound deliveries sharing a logical channel key within a
//! sliding time window. See [`controller::BurstController`].

pub mod config;
pub mod controller;

pub use config::{BurstConfig, BurstConfigBuilder, BurstMode};
pub use controller::{extract_burst_key, BurstController, BurstDecision};
