//! Shopify webhook template: HMAC-SHA256 over the raw body, base64-encoded, in
//! `X-Shopify-Hmac-Sha256`.

use super::hmac_verifier::{HmacVerifier, SignatureEncoding};
use crate::handler::Verifier;
use std::sync::Arc;

/// Delivery-id header candidates, in lookup order, for Shopify deliveries.
pub const DELIVERY_HEADERS: &[&str] = &["X-Shopify-Webhook-Id", "X-Request-Id"];

pub fn shopify_verifier(secret: impl Into<Vec<u8>>) -> Arc<dyn Verifier> {
    Arc::new(HmacVerifier::new(
        "X-Shopify-Hmac-Sha256",
        SignatureEncoding::Base64,
        secret.into(),
    ))
}
