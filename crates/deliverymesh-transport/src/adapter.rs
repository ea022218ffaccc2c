//! The adapter contract every transport kind implements.

use crate::cancel::CancelToken;
use crate::message::{TransportRequest, TransportResponse};
use async_trait::async_trait;
use deliverymesh_core::MeshError;

#[async_trait]
pub trait TransportAdapter: Send + Sync {
    fn kind(&self) -> &str;
    async fn do_request(
        &self,
        cancel: &CancelToken,
        req: TransportRequest,
    ) -> Result<TransportResponse, MeshError>;
}
