//! Pinterest webhook template: HMAC-SHA256 over the raw body, hex-encoded, in
//! `X-Pinterest-Hmac-Sha256`.

use super::hmac_verifier::{HmacVerifier, SignatureEncoding};
use crate::handler::Verifier;
use std::sync::Arc;

pub const DELIVERY_HEADERS: &[&str] = &["X-Pinterest-Delivery-Id", "X-Pinterest-Request-Id"];

pub fn pinterest_verifier(secret: impl Into<Vec<u8>>) -> Arc<dyn Verifier> {
    Arc::new(HmacVerifier::new(
        "X-Pinterest-Hmac-Sha256",
        SignatureEncoding::Hex,
        secret.into(),
    ))
}
