//! Resolves a credential (ID token or access token) into a [`Profile`], the identity boundary
//! other components treat as a pluggable collaborator.

use crate::profile::Profile;
use deliverymesh_core::MeshError;
use std::collections::HashMap;

/// Verifies an ID token and returns its claim map. Pluggable so callers can swap in a real JWT
/// verifier without this crate depending on a specific JOSE library.
pub trait IdTokenVerifier: Send + Sync {
    fn verify(&self, id_token: &str) -> Result<HashMap<String, String>, MeshError>;
}

/// Where to call for userinfo-style resolution when no ID token is presented.
#[derive(Clone)]
pub struct UserinfoConfig {
    pub endpoint: String,
}

pub struct IdentityResolver<V: IdTokenVerifier> {
    verifier: Option<V>,
    userinfo: Option<UserinfoConfig>,
    http: reqwest::Client,
}

impl<V: IdTokenVerifier> IdentityResolver<V> {
    pub fn new(verifier: Option<V>, userinfo: Option<UserinfoConfig>) -> Self {
        Self {
            verifier,
            userinfo,
            http: reqwest::Client::new(),
        }
    }

    /// Resolves a profile from an ID token (verified locally) or, failing that, by calling the
    /// configured userinfo endpoint with the access token as a bearer credential.
    pub async fn resolve(
        &self,
        id_token: Option<&str>,
        access_token: Option<&str>,
    ) -> Result<Profile, MeshError> {
        if let (Some(token), Some(verifier)) = (id_token, self.verifier.as_ref()) {
            let claims = verifier.verify(token)?;
            return Ok(Profile::from_claims(claims));
        }

        let (Some(config), Some(access_token)) = (self.userinfo.as_ref(), access_token) else {
            return Err(MeshError::profile_not_found("no id_token verifier or userinfo config"));
        };

        let response = self
            .http
            .get(&config.endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| MeshError::external(format!("userinfo request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(MeshError::external(format!(
                "userinfo endpoint returned {}",
                response.status()
            )));
        }

        let claims: HashMap<String, String> = response
            .json()
            .await
            .map_err(|e| MeshError::external(format!("userinfo response was not valid JSON: {e}")))?;

        Ok(Profile::from_claims(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedVerifier(HashMap<String, String>);

    impl IdTokenVerifier for FixedVerifier {
        fn verify(&self, _id_token: &str) -> Result<HashMap<String, String>, MeshError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn id_token_path_composes_issuer_and_subject() {
        let mut claims = HashMap::new();
        claims.insert("iss".to_string(), "https://accounts.example.com".to_string());
        claims.insert("sub".to_string(), "user-123".to_string());
        let resolver = IdentityResolver::new(Some(FixedVerifier(claims)), None);

        let profile = resolver.resolve(Some("token"), None).await.unwrap();
        assert_eq!(profile.external_account_id, "https://accounts.example.com|user-123");
    }

    #[tokio::test]
    async fn subject_alone_when_issuer_absent() {
        let mut claims = HashMap::new();
        claims.insert("sub".to_string(), "user-123".to_string());
        let resolver = IdentityResolver::new(Some(FixedVerifier(claims)), None);

        let profile = resolver.resolve(Some("token"), None).await.unwrap();
        assert_eq!(profile.external_account_id, "user-123");
    }

    #[tokio::test]
    async fn missing_verifier_and_userinfo_is_profile_not_found() {
        let resolver: IdentityResolver<FixedVerifier> = IdentityResolver::new(None, None);
        let err = resolver.resolve(None, None).await.unwrap_err();
        assert!(err.is_profile_not_found());
        assert_eq!(err.http_status(), 404);
    }
}
