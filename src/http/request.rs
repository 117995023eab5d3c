//! Request inspection.
//!
//! # Responsibilities
//! - Read the caller-supplied correlation identifier
//!
//! # Design Decisions
//! - The identifier is opaque: no validation, no generation when absent
//! - Header bytes are read as UTF-8 when valid and as latin-1 otherwise, so
//!   any present, non-empty value is kept
//! - An empty header value counts as absent

use std::borrow::Cow;

use axum::http::{HeaderMap, HeaderValue, Request};

/// Header carrying the caller's correlation identifier.
pub const X_CORRELATION_ID: &str = "x-correlation-id";

/// Access to the correlation identifier of a request.
pub trait CorrelationIdExt {
    fn correlation_id(&self) -> Option<Cow<'_, str>>;
}

impl CorrelationIdExt for HeaderMap {
    fn correlation_id(&self) -> Option<Cow<'_, str>> {
        self.get(X_CORRELATION_ID)
            .filter(|value| !value.is_empty())
            .map(header_text)
    }
}

impl<B> CorrelationIdExt for Request<B> {
    fn correlation_id(&self) -> Option<Cow<'_, str>> {
        self.headers().correlation_id()
    }
}

fn header_text(value: &HeaderValue) -> Cow<'_, str> {
    match std::str::from_utf8(value.as_bytes()) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(value.as_bytes().iter().map(|&b| char::from(b)).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_correlation_id_present() {
        let req = Request::builder()
            .header("X-Correlation-ID", "abc123")
            .body(Body::default())
            .unwrap();
        assert_eq!(req.correlation_id().as_deref(), Some("abc123"));
    }

    #[test]
    fn test_correlation_id_absent_or_empty() {
        let req = Request::builder().body(Body::default()).unwrap();
        assert_eq!(req.correlation_id(), None);

        let mut headers = HeaderMap::new();
        headers.insert(X_CORRELATION_ID, HeaderValue::from_static(""));
        assert_eq!(headers.correlation_id(), None);
    }

    #[test]
    fn test_correlation_id_non_ascii_bytes() {
        let mut headers = HeaderMap::new();
        headers.insert(X_CORRELATION_ID, HeaderValue::from_bytes(b"caf\xc3\xa9-1").unwrap());
        assert_eq!(headers.correlation_id().as_deref(), Some("café-1"));

        headers.insert(X_CORRELATION_ID, HeaderValue::from_bytes(b"caf\xe9-1").unwrap());
        assert_eq!(headers.correlation_id().as_deref(), Some("café-1"));
    }
}
