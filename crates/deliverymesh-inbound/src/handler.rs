//! The seams a caller plugs provider-authenticity checks and per-surface business logic into.

use crate::message::{InboundRequest, InboundResult};
use async_trait::async_trait;
use deliverymesh_core::MeshError;

/// Verifies provider authenticity of an inbound request. Any error rejects the request with a
/// 401; verifiers never themselves decide acceptance beyond pass/fail.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(&self, req: &InboundRequest) -> Result<(), MeshError>;
}

/// Per-surface business logic, invoked once a request has cleared verification and claimed
/// idempotency.
#[async_trait]
pub trait Handler: Send + Sync {
    fn surface(&self) -> &str;
    async fn handle(&self, req: &InboundRequest) -> Result<InboundResult, MeshError>;
}
