//! The canonical identity profile an inbound credential resolves to.

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Profile {
    /// `issuer "|" subject` when an issuer claim is present; otherwise the subject alone.
    pub external_account_id: String,
    pub claims: HashMap<String, String>,
}

impl Profile {
    pub fn from_claims(claims: HashMap<String, String>) -> Self {
        let subject = claims.get("sub").cloned().unwrap_or_default();
        let external_account_id = match claims.get("iss") {
            Some(issuer) if !issuer.is_empty() => format!("{issuer}|{subject}"),
            _ => subject,
        };
        Self {
            external_account_id,
            claims,
        }
    }
}
