//! Thin protocol-shaped wrappers (SOAP, bulk, stream, file) that pre-shape a request and
//! delegate to [`RestAdapter`] for the actual transfer.

use crate::adapter::TransportAdapter;
use crate::cancel::CancelToken;
use crate::message::{TransportRequest, TransportResponse};
use crate::rest::RestAdapter;
use async_trait::async_trait;
use deliverymesh_core::MeshError;

/// A protocol wrapper that sets a content type and method before delegating to REST.
#[derive(Clone)]
pub struct ProtocolAdapter {
    kind: &'static str,
    content_type: Option<&'static str>,
    rest: RestAdapter,
}

impl ProtocolAdapter {
    pub fn soap(rest: RestAdapter) -> Self {
        Self {
            kind: "soap",
            content_type: Some("text/xml; charset=utf-8"),
            rest,
        }
    }

    pub fn bulk(rest: RestAdapter) -> Self {
        Self {
            kind: "bulk",
            content_type: Some("application/json"),
            rest,
        }
    }

    pub fn stream(rest: RestAdapter) -> Self {
        Self {
            kind: "stream",
            content_type: None,
            rest,
        }
    }

    pub fn file(rest: RestAdapter) -> Self {
        Self {
            kind: "file",
            content_type: Some("application/octet-stream"),
            rest,
        }
    }
}

#[async_trait]
impl TransportAdapter for ProtocolAdapter {
    fn kind(&self) -> &str {
        self.kind
    }

    async fn do_request(
        &self,
        cancel: &CancelToken,
        mut req: TransportRequest,
    ) -> Result<TransportResponse, MeshError> {
        if req.normalized_method() == "GET" && !req.body.is_empty() {
            req.method = "POST".to_string();
        }
        if let Some(content_type) = self.content_type {
            if !req.headers.contains("content-type") {
                req.headers.set("content-type", content_type);
            }
        }

        let mut response = self.rest.do_request(cancel, req).await?;
        response
            .metadata
            .insert("kind".to_string(), self.kind.to_string());
        response
            .metadata
            .insert("protocol_adapter".to_string(), self.kind.to_string());
        Ok(response)
    }
}

/// A placeholder for a protocol kind that is configured but has no adapter implementation yet.
/// `do_request` always reports a 501-equivalent operation failure rather than panicking.
#[derive(Clone)]
pub struct UnsupportedAdapter {
    kind: String,
}

impl UnsupportedAdapter {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }
}

#[async_trait]
impl TransportAdapter for UnsupportedAdapter {
    fn kind(&self) -> &str {
        &self.kind
    }

    async fn do_request(
        &self,
        _cancel: &CancelToken,
        _req: TransportRequest,
    ) -> Result<TransportResponse, MeshError> {
        Err(MeshError::operation(format!(
            "transport adapter \"{}\" is registered but not implemented",
            self.kind
        ))
        .with_metadata("http_status_hint", "501"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unsupported_adapter_reports_operation_failure() {
        let adapter = UnsupportedAdapter::new("sftp");
        let cancel = CancelToken::new();
        let req = TransportRequest::new("sftp://example.com/drop");
        let err = adapter.do_request(&cancel, req).await.unwrap_err();
        assert_eq!(err.category(), deliverymesh_core::ErrorCategory::Operation);
        assert_eq!(err.http_status(), 501);
    }
}
