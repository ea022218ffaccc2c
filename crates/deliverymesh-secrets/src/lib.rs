//! Versioned, key-id-tagged secret envelopes. See [`provider::SecretProvider`].

pub mod envelope;
pub mod provider;

pub use envelope::Envelope;
pub use provider::{EnvelopeSecretProvider, KeyResolver, SecretProvider};
