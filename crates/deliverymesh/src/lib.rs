//! `deliverymesh` is the provider-integration backbone: a set of small, composable crates for
//! receiving webhooks exactly once, calling out to provider APIs without tripping their rate
//! limits, and keeping bulk syncs resumable across restarts.
//!
//! Each concern lives in its own crate and is re-exported here behind a feature flag of the
//! same name, so a service only pulls in what it uses:
//!
//! - [`claimstore`] / [`ledger`]: idempotency. A claim store gives you claim-lease-complete
//!   semantics for any inbound request; the delivery ledger builds on it with attempt counts
//!   and dead-lettering for webhook deliveries specifically.
//! - [`burst`]: suppress or coalesce bursts of near-duplicate events on a logical channel.
//! - [`retrypolicy`]: turn a provider's rate-limit response headers into a concrete backoff
//!   delay for the next attempt.
//! - [`inbound`]: the dispatcher and webhook processor that wire the claim store, ledger, burst
//!   controller and retry policy together, plus signature verifier templates for common
//!   providers.
//! - [`ratelimit`]: the outbound counterpart — throttle calls against a provider before they're
//!   sent, adapting to the provider's own reported limits.
//! - [`transport`]: adapters that make the HTTP call (REST, GraphQL-over-REST, and templates for
//!   SOAP/bulk/streaming/file-based protocols), plus a registry to look one up by kind.
//! - [`sync`]: the bulk-sync job orchestrator — bootstrap, backfill and incremental jobs with
//!   checkpointing so a crashed sync resumes instead of restarting.
//! - [`identity`]: resolving a connection to the credential profile it should authenticate with.
//! - [`secrets`]: encrypted envelopes for the credentials those profiles hold.
//!
//! [`core`] is always available and supplies the pieces every other crate here shares: the
//! error envelope, the clock abstraction used for deterministic tests, and the header map type.

pub use deliverymesh_core as core;

#[cfg(feature = "burst")]
pub use deliverymesh_burst as burst;

#[cfg(feature = "claimstore")]
pub use deliverymesh_claimstore as claimstore;

#[cfg(feature = "identity")]
pub use deliverymesh_identity as identity;

#[cfg(feature = "inbound")]
pub use deliverymesh_inbound as inbound;

#[cfg(feature = "ledger")]
pub use deliverymesh_ledger as ledger;

#[cfg(feature = "ratelimit")]
pub use deliverymesh_ratelimit as ratelimit;

#[cfg(feature = "retrypolicy")]
pub use deliverymesh_retrypolicy as retrypolicy;

#[cfg(feature = "secrets")]
pub use deliverymesh_secrets as secrets;

#[cfg(feature = "sync")]
pub use deliverymesh_sync as sync;

#[cfg(feature = "transport")]
pub use deliverymesh_transport as transport;
