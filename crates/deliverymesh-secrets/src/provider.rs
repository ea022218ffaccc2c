//! [`SecretProvider`]: the pluggable boundary for encrypting and decrypting small secret
//! payloads (provider API tokens, webhook HMAC keys) behind a versioned envelope.

use crate::envelope::{Envelope, ALG_AES_256_GCM};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use deliverymesh_core::MeshError;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Capability contract for a secret backend.
pub trait SecretProvider: Send + Sync {
    fn encrypt(&self, kid: &str, ver: u32, plaintext: &[u8]) -> Result<String, MeshError>;
    fn decrypt(&self, kid: &str, ver: u32, envelope: &str) -> Result<Vec<u8>, MeshError>;
}

/// Resolves key material for a `(kid, ver)` pair. Key bytes sized 16/24/32 are used directly as
/// AES-128/192/256 key material; any other size is hashed with SHA-256 to derive a 32-byte key.
pub trait KeyResolver: Send + Sync {
    fn resolve(&self, kid: &str, ver: u32) -> Option<Vec<u8>>;
}

fn derive_key(raw: &[u8]) -> [u8; 32] {
    if raw.len() == 32 {
        let mut key = [0u8; 32];
        key.copy_from_slice(raw);
        return key;
    }
    let mut hasher = Sha256::new();
    hasher.update(raw);
    hasher.finalize().into()
}

/// The default [`SecretProvider`]: AES-256-GCM under the `services.secret.v1:` envelope.
pub struct EnvelopeSecretProvider<K: KeyResolver> {
    keys: K,
}

impl<K: KeyResolver> EnvelopeSecretProvider<K> {
    pub fn new(keys: K) -> Self {
        Self { keys }
    }

    fn cipher_for(&self, kid: &str, ver: u32) -> Result<Aes256Gcm, MeshError> {
        let raw = self
            .keys
            .resolve(kid, ver)
            .ok_or_else(|| MeshError::not_found(format!("no key material for kid={kid} ver={ver}")))?;
        let key_bytes = derive_key(&raw);
        Ok(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes)))
    }
}

impl<K: KeyResolver> SecretProvider for EnvelopeSecretProvider<K> {
    fn encrypt(&self, kid: &str, ver: u32, plaintext: &[u8]) -> Result<String, MeshError> {
        let cipher = self.cipher_for(kid, ver)?;
        let mut nonce_bytes = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| MeshError::internal(format!("encryption failed: {e}")))?;

        let envelope = Envelope {
            kid: kid.to_string(),
            ver,
            alg: ALG_AES_256_GCM.to_string(),
            nonce: BASE64.encode(nonce_bytes),
            ciphertext: BASE64.encode(ciphertext),
        };
        Ok(envelope.encode())
    }

    fn decrypt(&self, kid: &str, ver: u32, envelope: &str) -> Result<Vec<u8>, MeshError> {
        let envelope = Envelope::decode(envelope)
            .ok_or_else(|| MeshError::bad_input("malformed secret envelope"))?;
        if envelope.kid != kid || envelope.ver != ver {
            return Err(MeshError::bad_input("envelope kid/ver mismatch"));
        }
        if envelope.alg != ALG_AES_256_GCM {
            return Err(MeshError::bad_input(format!(
                "unsupported envelope algorithm: {}",
                envelope.alg
            )));
        }

        let cipher = self.cipher_for(kid, ver)?;
        let nonce_bytes = BASE64
            .decode(&envelope.nonce)
            .map_err(|_| MeshError::bad_input("malformed envelope nonce"))?;
        let ciphertext = BASE64
            .decode(&envelope.ciphertext)
            .map_err(|_| MeshError::bad_input("malformed envelope ciphertext"))?;
        let nonce = Nonce::from_slice(&nonce_bytes);
        cipher
            .decrypt(nonce, ciphertext.as_ref())
            .map_err(|_| MeshError::auth("secret decryption failed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct StaticKeys(Mutex<HashMap<(String, u32), Vec<u8>>>);

    impl KeyResolver for StaticKeys {
        fn resolve(&self, kid: &str, ver: u32) -> Option<Vec<u8>> {
            self.0.lock().unwrap().get(&(kid.to_string(), ver)).cloned()
        }
    }

    fn keyring() -> StaticKeys {
        let mut map = HashMap::new();
        map.insert(("shopify-hmac".to_string(), 1), b"not-a-32-byte-key".to_vec());
        StaticKeys(Mutex::new(map))
    }

    #[test]
    fn decrypt_inverts_encrypt_for_same_kid_and_ver() {
        let provider = EnvelopeSecretProvider::new(keyring());
        let ciphertext = provider.encrypt("shopify-hmac", 1, b"super-secret-token").unwrap();
        let plaintext = provider.decrypt("shopify-hmac", 1, &ciphertext).unwrap();
        assert_eq!(plaintext, b"super-secret-token");
    }

    #[test]
    fn mismatched_version_is_rejected() {
        let provider = EnvelopeSecretProvider::new(keyring());
        let ciphertext = provider.encrypt("shopify-hmac", 1, b"token").unwrap();
        let err = provider.decrypt("shopify-hmac", 2, &ciphertext).unwrap_err();
        assert_eq!(err.category(), deliverymesh_core::ErrorCategory::BadInput);
    }

    #[test]
    fn envelope_carries_the_expected_prefix() {
        let provider = EnvelopeSecretProvider::new(keyring());
        let ciphertext = provider.encrypt("shopify-hmac", 1, b"token").unwrap();
        assert!(ciphertext.starts_with(crate::envelope::ENVELOPE_PREFIX));
    }
}
