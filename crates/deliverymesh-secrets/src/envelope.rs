//! The persisted envelope format: `services.secret.v1:` followed by a JSON object carrying the
//! key id, key version, algorithm tag, nonce, and ciphertext, each base64-encoded.

use serde::{Deserialize, Serialize};

pub const ENVELOPE_PREFIX: &str = "services.secret.v1:";
pub const ALG_AES_256_GCM: &str = "aes-256-gcm";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub kid: String,
    pub ver: u32,
    pub alg: String,
    pub nonce: String,
    pub ciphertext: String,
}

impl Envelope {
    pub fn encode(&self) -> String {
        format!(
            "{ENVELOPE_PREFIX}{}",
            serde_json::to_string(self).expect("envelope serializes")
        )
    }

    pub fn decode(raw: &str) -> Option<Self> {
        let body = raw.strip_prefix(ENVELOPE_PREFIX)?;
        serde_json::from_str(body).ok()
    }
}
