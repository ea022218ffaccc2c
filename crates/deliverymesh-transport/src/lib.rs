//! Transport adapters translate a provider-agnostic request/response shape onto REST,
//! GraphQL, and other protocol surfaces, behind a kind-keyed [`AdapterRegistry`].
//!
//! [`RestAdapter`] does the actual HTTP work; [`GraphQlAdapter`] and [`ProtocolAdapter`] are
//! thin wrappers that pre-shape a request and delegate to it.

pub mod adapter;
pub mod cancel;
pub mod graphql;
pub mod message;
pub mod protocol;
pub mod registry;
pub mod rest;

pub use adapter::TransportAdapter;
pub use cancel::CancelToken;
pub use graphql::GraphQlAdapter;
pub use message::{TransportRequest, TransportResponse};
pub use protocol::{ProtocolAdapter, UnsupportedAdapter};
pub use registry::AdapterRegistry;
pub use rest::RestAdapter;
