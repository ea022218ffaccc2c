//! Webhook-delivery claim ledger: a claim-store-shaped lifecycle specialized to
//! `(provider_id, delivery_id)` with attempt-bounded dead-lettering. See
//! [`ledger::DeliveryLedger`] for the contract.

pub mod ledger;
pub mod record;

pub use ledger::{DeliveryLedger, InMemoryDeliveryLedger, LedgerDefaults};
pub use record::{DeliveryRecord, DeliveryStatus};
