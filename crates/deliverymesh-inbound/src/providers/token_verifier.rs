//! A constant-time shared-secret equality check, used by providers (Google, Amazon) that hand
//! back a bare verification token instead of an HMAC signature.

use crate::handler::Verifier;
use crate::message::InboundRequest;
use async_trait::async_trait;
use deliverymesh_core::MeshError;
use subtle::ConstantTimeEq;

pub struct TokenEqualityVerifier {
    header: &'static str,
    expected: Vec<u8>,
}

impl TokenEqualityVerifier {
    pub fn new(header: &'static str, expected: impl Into<String>) -> Self {
        Self {
            header,
            expected: expected.into().into_bytes(),
        }
    }
}

#[async_trait]
impl Verifier for TokenEqualityVerifier {
    async fn verify(&self, req: &InboundRequest) -> Result<(), MeshError> {
        if self.expected.is_empty() {
            return Err(MeshError::auth("verification token is not configured"));
        }
        let header_value = req
            .headers
            .get(self.header)
            .ok_or_else(|| MeshError::auth(format!("missing {} header", self.header)))?;
        let provided = header_value.trim().as_bytes();
        if provided.is_empty() {
            return Err(MeshError::auth(format!("{} header is empty", self.header)));
        }
        if provided.ct_eq(&self.expected).into() {
            Ok(())
        } else {
            Err(MeshError::auth("verification token mismatch"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn matching_token_passes() {
        let verifier = TokenEqualityVerifier::new("X-Goog-Channel-Token", "expected-token");
        let mut req = InboundRequest::new("google", "webhook");
        req.headers.insert("X-Goog-Channel-Token", "expected-token");
        assert!(verifier.verify(&req).await.is_ok());
    }

    #[tokio::test]
    async fn mismatched_token_is_rejected() {
        let verifier = TokenEqualityVerifier::new("X-Goog-Channel-Token", "expected-token");
        let mut req = InboundRequest::new("google", "webhook");
        req.headers.insert("X-Goog-Channel-Token", "wrong-token");
        assert!(verifier.verify(&req).await.is_err());
    }
}
