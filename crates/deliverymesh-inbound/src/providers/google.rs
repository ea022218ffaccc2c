//! Google webhook template: a bare channel verification token, compared for equality, in
//! `X-Goog-Channel-Token`.

use super::token_verifier::TokenEqualityVerifier;
use crate::handler::Verifier;
use std::sync::Arc;

pub const DELIVERY_HEADERS: &[&str] = &["X-Goog-Message-Number", "X-Goog-Resource-Id"];

pub fn google_verifier(token: impl Into<String>) -> Arc<dyn Verifier> {
    Arc::new(TokenEqualityVerifier::new("X-Goog-Channel-Token", token))
}
