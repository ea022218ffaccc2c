//! Meta webhook template: HMAC-SHA256 over the raw body, hex-encoded with a `sha256=` prefix,
//! in `X-Hub-Signature-256`.

use super::hmac_verifier::{HmacVerifier, SignatureEncoding};
use crate::handler::Verifier;
use std::sync::Arc;

pub const DELIVERY_HEADERS: &[&str] = &["X-Meta-Delivery-Id", "X-Hub-Signature-256"];

pub fn meta_verifier(secret: impl Into<Vec<u8>>) -> Arc<dyn Verifier> {
    Arc::new(HmacVerifier::new(
        "X-Hub-Signature-256",
        SignatureEncoding::HexPrefixed("sha256="),
        secret.into(),
    ))
}
