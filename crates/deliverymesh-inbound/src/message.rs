//! `InboundRequest`/`InboundResult`: the shapes an inbound delivery is normalized into and the
//! shape a handler reports back.

use deliverymesh_core::{normalize_provider_id, normalize_surface, HeaderMap};
use std::collections::HashMap;

/// Surfaces a handler may register for.
pub const SUPPORTED_SURFACES: &[&str] = &["webhook", "command", "interaction", "event_callback"];

#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub provider_id: String,
    pub surface: String,
    pub headers: HeaderMap,
    pub metadata: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl InboundRequest {
    pub fn new(provider_id: impl Into<String>, surface: impl Into<String>) -> Self {
        Self {
            provider_id: normalize_provider_id(&provider_id.into()),
            surface: normalize_surface(&surface.into()),
            headers: HeaderMap::new(),
            metadata: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Looks up a value by metadata key candidates first, then header key candidates, trimming
    /// whitespace from both keys and values as it goes.
    pub fn find(&self, metadata_keys: &[&str], header_keys: &[&str]) -> Option<String> {
        for key in metadata_keys {
            if let Some(value) = self.metadata.get(*key) {
                let value = value.trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
        for key in header_keys {
            if let Some(value) = self.headers.get(key) {
                let value = value.trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
        None
    }
}

#[derive(Debug, Clone, Default)]
pub struct InboundResult {
    pub accepted: bool,
    pub status_code: u16,
    pub metadata: HashMap<String, String>,
}

impl InboundResult {
    pub fn accepted(status_code: u16) -> Self {
        Self {
            accepted: true,
            status_code,
            metadata: HashMap::new(),
        }
    }

    pub fn rejected(status_code: u16) -> Self {
        Self {
            accepted: false,
            status_code,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
