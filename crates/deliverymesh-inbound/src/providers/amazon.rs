//! Amazon webhook template: a bare signature token, compared for equality, in
//! `X-Amz-Signature`.

use super::token_verifier::TokenEqualityVerifier;
use crate::handler::Verifier;
use std::sync::Arc;

pub const DELIVERY_HEADERS: &[&str] = &["X-Amz-Sns-Message-Id", "X-Amz-Request-Id"];

pub fn amazon_verifier(token: impl Into<String>) -> Arc<dyn Verifier> {
    Arc::new(TokenEqualityVerifier::new("X-Amz-Signature", token))
}
