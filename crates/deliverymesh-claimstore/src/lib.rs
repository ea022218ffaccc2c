//! Keyed claim lifecycle with leases: the idempotency primitive the inbound dispatcher and
//! webhook ledger are built on. See [`store::ClaimStore`] for the contract and
//! [`store::InMemoryClaimStore`] for the default backend.

pub mod config;
pub mod store;

pub use config::{ClaimStoreConfig, ClaimStoreConfigBuilder};
pub use store::{ClaimEntry, ClaimStatus, ClaimStore, InMemoryClaimStore};
