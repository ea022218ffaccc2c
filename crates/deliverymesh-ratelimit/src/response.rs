//! Parses the provider response metadata `AfterCall` is fed: rate-limit headers and an
//! optional explicit `retry_after` carried in the response body.

use chrono::{DateTime, Utc};
use deliverymesh_core::HeaderMap;
use std::time::Duration;

/// Everything `AfterCall` needs to know about one outbound response.
#[derive(Debug, Clone, Default)]
pub struct ResponseObservation {
    pub status: u16,
    pub headers: HeaderMap,
    /// An explicit retry-after duration carried in the response body, when the provider reports
    /// it out-of-band from headers.
    pub body_retry_after: Option<Duration>,
}

/// The header/body fields this module extracts before the policy applies its throttle rules.
#[derive(Debug, Clone, Default)]
pub struct ParsedObservation {
    pub limit: Option<i64>,
    pub remaining: Option<i64>,
    pub reset_at: Option<DateTime<Utc>>,
    pub retry_after: Option<Duration>,
}

pub fn parse(observation: &ResponseObservation, now: DateTime<Utc>) -> ParsedObservation {
    let limit = observation
        .headers
        .get("X-RateLimit-Limit")
        .and_then(|v| v.trim().parse::<i64>().ok());
    let remaining = observation
        .headers
        .get("X-RateLimit-Remaining")
        .and_then(|v| v.trim().parse::<i64>().ok());
    let reset_at = observation
        .headers
        .get("X-RateLimit-Reset")
        .and_then(|v| v.trim().parse::<i64>().ok())
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

    let retry_after = observation
        .headers
        .get("Retry-After")
        .and_then(|raw| parse_retry_after(raw, now))
        .or(observation.body_retry_after);

    ParsedObservation {
        limit,
        remaining,
        reset_at,
        retry_after,
    }
}

fn parse_retry_after(raw: &str, now: DateTime<Utc>) -> Option<Duration> {
    let raw = raw.trim();
    if let Ok(seconds) = raw.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let at = httpdate::parse_http_date(raw).ok()?;
    let at: DateTime<Utc> = at.into();
    let delta = at - now;
    delta.to_std().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert("Retry-After", "30");
        let obs = ResponseObservation {
            status: 429,
            headers,
            body_retry_after: None,
        };
        let parsed = parse(&obs, Utc::now());
        assert_eq!(parsed.retry_after, Some(Duration::from_secs(30)));
    }

    #[test]
    fn parses_rate_limit_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("X-RateLimit-Limit", "100");
        headers.insert("X-RateLimit-Remaining", "0");
        headers.insert("X-RateLimit-Reset", "1700000000");
        let obs = ResponseObservation {
            status: 200,
            headers,
            body_retry_after: None,
        };
        let parsed = parse(&obs, Utc::now());
        assert_eq!(parsed.limit, Some(100));
        assert_eq!(parsed.remaining, Some(0));
        assert!(parsed.reset_at.is_some());
    }

    #[test]
    fn body_retry_after_is_a_fallback() {
        let obs = ResponseObservation {
            status: 429,
            headers: HeaderMap::new(),
            body_retry_after: Some(Duration::from_secs(5)),
        };
        let parsed = parse(&obs, Utc::now());
        assert_eq!(parsed.retry_after, Some(Duration::from_secs(5)));
    }
}
