//! The REST adapter: default method `GET`, query merging, a bounded-size response read, and the
//! adapter every other HTTP-shaped adapter delegates to.

use crate::adapter::TransportAdapter;
use crate::cancel::CancelToken;
use crate::message::{TransportRequest, TransportResponse};
use async_trait::async_trait;
use deliverymesh_core::{HeaderMap, MeshError};
use std::time::{Duration, Instant};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct RestAdapter {
    client: reqwest::Client,
    default_headers: HeaderMap,
    default_timeout: Duration,
    default_max_response_bytes: usize,
}

impl RestAdapter {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            default_headers: HeaderMap::new(),
            default_timeout: DEFAULT_TIMEOUT,
            default_max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }

    pub fn with_default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = headers;
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_default_max_response_bytes(mut self, max: usize) -> Self {
        self.default_max_response_bytes = max;
        self
    }
}

impl Default for RestAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransportAdapter for RestAdapter {
    fn kind(&self) -> &str {
        "rest"
    }

    async fn do_request(
        &self,
        cancel: &CancelToken,
        req: TransportRequest,
    ) -> Result<TransportResponse, MeshError> {
        let method = reqwest::Method::from_bytes(req.normalized_method().as_bytes())
            .map_err(|_| MeshError::bad_input(format!("invalid HTTP method: {}", req.method)))?;

        let mut url = reqwest::Url::parse(&req.url)
            .map_err(|e| MeshError::bad_input(format!("invalid URL: {e}")))?;
        let existing_query: Vec<(String, String)> =
            url.query_pairs().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        url.set_query(None);
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in existing_query {
                let k = k.trim();
                if !k.is_empty() {
                    pairs.append_pair(k, &v);
                }
            }
            for (k, v) in &req.query {
                let k = k.trim();
                if k.is_empty() || v.is_empty() {
                    continue;
                }
                pairs.append_pair(k, v);
            }
        }

        let mut builder = self.client.request(method, url);
        for (name, value) in self.default_headers.iter() {
            builder = builder.header(name, value);
        }
        for (name, value) in req.headers.iter() {
            builder = builder.header(name, value);
        }
        builder = builder.timeout(req.timeout.unwrap_or(self.default_timeout));
        if !req.body.is_empty() {
            builder = builder.body(req.body.clone());
        }

        let start = Instant::now();
        let response = tokio::select! {
            result = builder.send() => result.map_err(|e| MeshError::external(format!("request failed: {e}")))?,
            _ = cancel.cancelled() => return Err(MeshError::external("request cancelled")),
        };

        let status_code = response.status().as_u16();
        let mut headers = HeaderMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str(), value);
            }
        }

        let max = req.max_response_bytes.unwrap_or(self.default_max_response_bytes);
        let body = read_bounded_body(response, max, cancel).await?;

        let duration_ms = start.elapsed().as_millis();
        let mut metadata = req.metadata;
        metadata.insert("duration_ms".to_string(), duration_ms.to_string());
        metadata.insert("kind".to_string(), "rest".to_string());

        Ok(TransportResponse {
            status_code,
            headers,
            body,
            metadata,
        })
    }
}

/// Reads at most `max + 1` bytes; an overrun is reported as an external failure carrying
/// `response_limit_b` in metadata rather than silently truncating.
async fn read_bounded_body(
    mut response: reqwest::Response,
    max: usize,
    cancel: &CancelToken,
) -> Result<Vec<u8>, MeshError> {
    let mut buf = Vec::with_capacity(max.min(64 * 1024) + 1);
    loop {
        let chunk = tokio::select! {
            chunk = response.chunk() => chunk.map_err(|e| MeshError::external(format!("response read failed: {e}")))?,
            _ = cancel.cancelled() => return Err(MeshError::external("response read cancelled")),
        };
        let Some(chunk) = chunk else { break };
        buf.extend_from_slice(&chunk);
        if buf.len() > max {
            return Err(MeshError::external("response body exceeded the size cap")
                .with_metadata("response_limit_b", max.to_string()));
        }
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_method_defaults_to_get() {
        let req = TransportRequest::new("https://example.com/orders");
        assert_eq!(req.normalized_method(), "GET");
    }
}
