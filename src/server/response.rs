use http::StatusCode;
use serde::Serialize;

use super::body::Body;
use super::headers::Headers;

/// Canonical reason phrase for a status code, empty when unknown.
#[must_use]
pub fn status_reason(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
}

/// Outbound response.
///
/// Immutable once built: every modifier consumes the response and returns a
/// new one, so middleware post-processing always produces a fresh value.
#[derive(Debug)]
pub struct Response {
    status: u16,
    reason: String,
    headers: Headers,
    body: Body,
}

impl Response {
    /// Empty response with the canonical reason phrase for `status`.
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            reason: status_reason(status).to_string(),
            headers: Headers::new(),
            body: Body::Empty,
        }
    }

    #[must_use]
    pub fn ok() -> Self {
        Self::new(200)
    }

    /// JSON response with `Content-Type: application/json`.
    pub fn json<T: Serialize + ?Sized>(status: u16, value: &T) -> serde_json::Result<Self> {
        let bytes = serde_json::to_vec(value)?;
        Ok(Self::new(status)
            .with_header("Content-Type", "application/json")
            .with_body(bytes))
    }

    /// HTML response with `Content-Type: text/html; charset=utf-8`.
    #[must_use]
    pub fn html(status: u16, markup: impl Into<String>) -> Self {
        Self::new(status)
            .with_header("Content-Type", "text/html; charset=utf-8")
            .with_body(markup.into())
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self.reason = status_reason(status).to_string();
        self
    }

    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Add a header value after any existing values for the same name.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Replace all values for a header name.
    #[must_use]
    pub fn with_header_replaced(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    #[must_use]
    pub fn without_header(mut self, name: &str) -> Self {
        self.headers.remove(name);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    #[must_use]
    pub fn into_parts(self) -> (u16, String, Headers, Body) {
        (self.status, self.reason, self.headers, self.body)
    }
}
