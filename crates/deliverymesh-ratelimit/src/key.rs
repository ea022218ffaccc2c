//! `RateLimitKey`: partitions throttle state by `(provider_id, scope_type, scope_id, bucket_key)`.

use std::fmt;

/// A normalized rate-limit bucket identifier. All parts except `scope_id` are lower-cased and
/// trimmed; `scope_id` is trimmed only, since scope identifiers (account ids, shop domains) may
/// be case-sensitive upstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateLimitKey {
    pub provider_id: String,
    pub scope_type: String,
    pub scope_id: String,
    pub bucket_key: String,
}

impl RateLimitKey {
    pub fn new(
        provider_id: impl AsRef<str>,
        scope_type: impl AsRef<str>,
        scope_id: impl AsRef<str>,
        bucket_key: impl AsRef<str>,
    ) -> Self {
        Self {
            provider_id: provider_id.as_ref().trim().to_ascii_lowercase(),
            scope_type: scope_type.as_ref().trim().to_ascii_lowercase(),
            scope_id: scope_id.as_ref().trim().to_string(),
            bucket_key: bucket_key.as_ref().trim().to_ascii_lowercase(),
        }
    }

    pub fn as_storage_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.provider_id, self.scope_type, self.scope_id, self.bucket_key
        )
    }
}

impl fmt::Display for RateLimitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_storage_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_all_but_scope_id() {
        let key = RateLimitKey::new(" Shopify ", "Shop", "MyShop.myshopify.com", "Orders");
        assert_eq!(key.provider_id, "shopify");
        assert_eq!(key.scope_type, "shop");
        assert_eq!(key.scope_id, "MyShop.myshopify.com");
        assert_eq!(key.bucket_key, "orders");
    }
}
