//! Transport-agnostic request/response shapes every adapter translates to and from HTTP.

use deliverymesh_core::HeaderMap;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: String,
    pub url: String,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub timeout: Option<Duration>,
    pub max_response_bytes: Option<usize>,
    pub metadata: HashMap<String, String>,
}

impl TransportRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
            query: HashMap::new(),
            headers: HeaderMap::new(),
            body: Vec::new(),
            timeout: None,
            max_response_bytes: None,
            metadata: HashMap::new(),
        }
    }

    /// Normalizes the method to upper-case for comparisons and outgoing calls.
    pub fn normalized_method(&self) -> String {
        self.method.trim().to_ascii_uppercase()
    }
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status_code: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub metadata: HashMap<String, String>,
}
