//! Exponential backoff for the webhook processor's retry/dead-letter decision. See
//! [`policy::RetryPolicy`].

pub mod config;
pub mod policy;

pub use config::{RetryPolicyConfig, RetryPolicyConfigBuilder};
pub use policy::RetryPolicy;
