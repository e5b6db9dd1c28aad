use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap};

/// Status line and headers of a completed exchange.
///
/// Captured when the response body is first opened and never updated.
#[derive(Debug, Clone)]
pub struct ResponseMeta {
    status: StatusCode,
    headers: HeaderMap,
    reason: Option<String>,
}

impl ResponseMeta {
    pub(crate) const fn new(status: StatusCode, headers: HeaderMap) -> Self {
        Self {
            status,
            headers,
            reason: None,
        }
    }

    /// Record the reason phrase sent on the status line.
    pub(crate) fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    /// Numeric status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status.as_u16()
    }

    /// Whether the status selected the success stream (below 400).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.as_u16() < 400
    }

    /// Reason phrase from the status line.
    ///
    /// Falls back to the canonical phrase for the code, or an empty string
    /// when the code has none.
    #[must_use]
    pub fn message(&self) -> &str {
        self.reason
            .as_deref()
            .unwrap_or_else(|| self.status.canonical_reason().unwrap_or_default())
    }

    /// All response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of `name`, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// First `Content-Type` value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }
}
