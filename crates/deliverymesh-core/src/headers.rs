//! Case-insensitive header maps and the provider/surface normalization rules shared by the
//! inbound dispatcher, transport adapters, and rate-limit policy.

use std::collections::BTreeMap;
use std::fmt;

/// A case-insensitive multi-map of HTTP-style headers.
///
/// Keys are stored lower-cased. Repeated headers are joined with `", "` on insert, matching
/// how most HTTP libraries fold repeated header lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    inner: BTreeMap<String, String>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a header, joining onto any existing value for the same (case-insensitive) name.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        let key = name.as_ref().to_ascii_lowercase();
        let value = value.into();
        self.inner
            .entry(key)
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    /// Replaces any existing value for `name` outright.
    pub fn set(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.inner.insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, name: impl AsRef<str>) -> Option<&str> {
        self.inner.get(&name.as_ref().to_ascii_lowercase()).map(String::as_str)
    }

    pub fn contains(&self, name: impl AsRef<str>) -> bool {
        self.inner.contains_key(&name.as_ref().to_ascii_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl FromIterator<(String, String)> for HeaderMap {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut map = HeaderMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl fmt::Display for HeaderMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, v) in self.iter() {
            writeln!(f, "{k}: {v}")?;
        }
        Ok(())
    }
}

/// Normalizes a provider identifier: trims whitespace and lower-cases it, so `"Shopify "` and
/// `"shopify"` address the same registry entry, claim bucket, and rate-limit key.
pub fn normalize_provider_id(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// Normalizes a surface identifier the same way a provider id is normalized.
pub fn normalize_surface(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_headers_are_joined() {
        let mut headers = HeaderMap::new();
        headers.insert("X-RateLimit-Remaining", "10");
        headers.insert("x-ratelimit-remaining", "5");
        assert_eq!(headers.get("X-RATELIMIT-REMAINING"), Some("10, 5"));
    }

    #[test]
    fn set_replaces_rather_than_joins() {
        let mut headers = HeaderMap::new();
        headers.insert("Retry-After", "30");
        headers.set("retry-after", "60");
        assert_eq!(headers.get("Retry-After"), Some("60"));
    }

    #[test]
    fn provider_id_normalization_trims_and_lowercases() {
        assert_eq!(normalize_provider_id("  Shopify  "), "shopify");
        assert_eq!(normalize_surface("Orders"), "orders");
    }
}
