//! TikTok webhook template: HMAC-SHA256 over the raw body, hex-encoded, in `X-Tt-Signature`.

use super::hmac_verifier::{HmacVerifier, SignatureEncoding};
use crate::handler::Verifier;
use std::sync::Arc;

pub const DELIVERY_HEADERS: &[&str] = &["X-Tt-Request-Id", "X-Tt-Logid"];

pub fn tiktok_verifier(secret: impl Into<Vec<u8>>) -> Arc<dyn Verifier> {
    Arc::new(HmacVerifier::new("X-Tt-Signature", SignatureEncoding::Hex, secret.into()))
}
