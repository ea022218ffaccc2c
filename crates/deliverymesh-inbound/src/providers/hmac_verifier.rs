//! A generic HMAC-SHA256 signature verifier parameterized by header name and signature
//! encoding, shared by every HMAC-signing provider template.

use crate::handler::Verifier;
use crate::message::InboundRequest;
use async_trait::async_trait;
use base64::Engine;
use deliverymesh_core::MeshError;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// How a provider encodes its HMAC signature in the header value.
#[derive(Clone, Copy)]
pub enum SignatureEncoding {
    Base64,
    Hex,
    /// Hex-encoded, prefixed with a fixed literal (e.g. Meta's `sha256=`).
    HexPrefixed(&'static str),
}

pub struct HmacVerifier {
    header: &'static str,
    encoding: SignatureEncoding,
    secret: Vec<u8>,
}

impl HmacVerifier {
    pub fn new(header: &'static str, encoding: SignatureEncoding, secret: Vec<u8>) -> Self {
        Self { header, encoding, secret }
    }

    fn decode_signature(&self, raw: &str) -> Result<Vec<u8>, MeshError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(MeshError::auth(format!("{} header is empty", self.header)));
        }
        match self.encoding {
            SignatureEncoding::Base64 => base64::engine::general_purpose::STANDARD
                .decode(raw)
                .map_err(|_| MeshError::auth("failed to decode base64 signature")),
            SignatureEncoding::Hex => {
                hex::decode(raw).map_err(|_| MeshError::auth("failed to decode hex signature"))
            }
            SignatureEncoding::HexPrefixed(prefix) => {
                let stripped = raw
                    .strip_prefix(prefix)
                    .ok_or_else(|| MeshError::auth(format!("signature missing \"{prefix}\" prefix")))?;
                hex::decode(stripped).map_err(|_| MeshError::auth("failed to decode hex signature"))
            }
        }
    }
}

#[async_trait]
impl Verifier for HmacVerifier {
    async fn verify(&self, req: &InboundRequest) -> Result<(), MeshError> {
        if self.secret.is_empty() {
            return Err(MeshError::auth("HMAC secret is not configured"));
        }
        let header_value = req
            .headers
            .get(self.header)
            .ok_or_else(|| MeshError::auth(format!("missing {} header", self.header)))?;

        let provided = self.decode_signature(header_value)?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| MeshError::internal("HMAC key of invalid length"))?;
        mac.update(&req.body);
        let expected = mac.finalize().into_bytes();

        if expected.as_slice().ct_eq(&provided).into() {
            Ok(())
        } else {
            Err(MeshError::auth("HMAC signature mismatch"))
        }
    }
}
