//! The structured error envelope shared by every deliverymesh crate.
//!
//! Every public operation in this workspace returns `Result<T, MeshError>` (or a thin
//! newtype around it) instead of ad hoc string errors, so that callers composing multiple
//! components — claim store, ledger, dispatcher, rate limiter — never have to write manual
//! `From` conversions between incompatible error types.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// The fixed error categories from the delivery-processing error contract.
///
/// Each category maps to exactly one HTTP status and one stable text code; see
/// [`ErrorCategory::http_status`] and [`ErrorCategory::text_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    BadInput,
    Validation,
    Auth,
    Authz,
    RateLimit,
    NotFound,
    Conflict,
    Operation,
    External,
    Internal,
}

impl ErrorCategory {
    /// The HTTP status code aligned with this category.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCategory::BadInput | ErrorCategory::Validation => 400,
            ErrorCategory::Auth => 401,
            ErrorCategory::Authz => 403,
            ErrorCategory::NotFound => 404,
            ErrorCategory::Conflict => 409,
            ErrorCategory::RateLimit => 429,
            ErrorCategory::Operation | ErrorCategory::External => 502,
            ErrorCategory::Internal => 500,
        }
    }

    /// The stable, machine-readable text code for this category.
    pub fn text_code(self) -> &'static str {
        match self {
            ErrorCategory::BadInput | ErrorCategory::Validation => "bad_input",
            ErrorCategory::Auth => "unauthorized",
            ErrorCategory::Authz => "forbidden",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::Conflict => "conflict",
            ErrorCategory::RateLimit => "rate_limited",
            ErrorCategory::Operation => "operation_failed",
            ErrorCategory::External => "external_failure",
            ErrorCategory::Internal => "internal",
        }
    }

    /// Whether errors in this category are, in general, worth retrying.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorCategory::RateLimit | ErrorCategory::Operation | ErrorCategory::External
        )
    }
}

/// A structured error carrying enough context for callers to branch on category, render an
/// HTTP response, or log a stable identifier — without downcasting.
#[derive(Debug, Clone)]
pub struct MeshError {
    category: ErrorCategory,
    message: String,
    metadata: HashMap<String, String>,
}

impl MeshError {
    /// Builds a new error in the given category with a human-readable message.
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn bad_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::BadInput, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Auth, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Conflict, message)
    }

    pub fn operation(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Operation, message)
    }

    pub fn external(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::External, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Internal, message)
    }

    /// Sentinel for an absent rate-limit state record (`ErrStateNotFound` in spec terms).
    pub fn state_not_found(key: impl fmt::Display) -> Self {
        Self::new(ErrorCategory::NotFound, format!("state not found: {key}"))
            .with_metadata("sentinel", "state_not_found")
    }

    /// Sentinel for an unresolvable identity profile.
    pub fn profile_not_found(account: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::NotFound,
            format!("profile not found: {account}"),
        )
        .with_metadata("sentinel", "profile_not_found")
    }

    /// A throttled call, carrying the duration the caller should wait before retrying.
    pub fn throttled(retry_after: Duration) -> Self {
        Self::new(ErrorCategory::RateLimit, "call throttled")
            .with_metadata("sentinel", "throttled")
            .with_metadata("retry_after_ms", retry_after.as_millis().to_string())
    }

    pub fn is_state_not_found(&self) -> bool {
        self.metadata.get("sentinel").map(String::as_str) == Some("state_not_found")
    }

    pub fn is_profile_not_found(&self) -> bool {
        self.metadata.get("sentinel").map(String::as_str) == Some("profile_not_found")
    }

    pub fn is_throttled(&self) -> bool {
        self.metadata.get("sentinel").map(String::as_str) == Some("throttled")
    }

    /// Returns the `retry_after` duration carried by a throttled error, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        self.metadata
            .get("retry_after_ms")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
    }

    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    /// The HTTP status this error should render as. Usually the category's fixed status, but
    /// a `http_status_hint` metadata entry (set by callers who know a more specific code, such
    /// as 501 for an unimplemented transport adapter) overrides it.
    pub fn http_status(&self) -> u16 {
        self.metadata
            .get("http_status_hint")
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or_else(|| self.category.http_status())
    }

    pub fn text_code(&self) -> &'static str {
        self.category.text_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// Attaches a metadata key identifying the bucket the error occurred in (provider,
    /// surface, delivery_id, claim_id, ...), builder-style.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Attaches a best-effort cleanup failure alongside the primary error, per the
    /// propagation policy: cleanup failures are never swallowed.
    pub fn with_secondary(self, secondary: impl fmt::Display) -> Self {
        self.with_metadata("secondary_error", secondary.to_string())
    }
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.category.text_code(),
            self.http_status(),
            self.message
        )
    }
}

impl std::error::Error for MeshError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_maps_to_fixed_http_and_text_codes() {
        assert_eq!(ErrorCategory::BadInput.http_status(), 400);
        assert_eq!(ErrorCategory::BadInput.text_code(), "bad_input");
        assert_eq!(ErrorCategory::Auth.http_status(), 401);
        assert_eq!(ErrorCategory::RateLimit.http_status(), 429);
        assert_eq!(ErrorCategory::RateLimit.text_code(), "rate_limited");
        assert_eq!(ErrorCategory::Operation.http_status(), 502);
        assert_eq!(ErrorCategory::Internal.http_status(), 500);
    }

    #[test]
    fn throttled_error_carries_retry_after() {
        let err = MeshError::throttled(Duration::from_secs(5));
        assert!(err.is_throttled());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(5)));
        assert_eq!(err.category(), ErrorCategory::RateLimit);
    }

    #[test]
    fn http_status_hint_overrides_the_category_default() {
        let err = MeshError::operation("adapter not implemented")
            .with_metadata("http_status_hint", "501");
        assert_eq!(err.category(), ErrorCategory::Operation);
        assert_eq!(err.http_status(), 501);
    }

    #[test]
    fn secondary_error_is_attached_not_dropped() {
        let err = MeshError::operation("handler failed").with_secondary("fail() also errored");
        assert_eq!(
            err.metadata().get("secondary_error").map(String::as_str),
            Some("fail() also errored")
        );
    }

    #[test]
    fn sentinels_round_trip() {
        assert!(MeshError::state_not_found("k1").is_state_not_found());
        assert!(MeshError::profile_not_found("acct").is_profile_not_found());
    }
}
