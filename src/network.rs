//! The seam to the HTTP pipeline.
//!
//! Transport lives outside this crate. The pipeline exposes its request and
//! response objects through [`TrackedRequest`] and [`ReceivedResponse`];
//! [`Request`] and [`Response`] are plain implementations for hosts that
//! don't have their own types, and for tests.

use std::collections::HashMap;

use uuid::Uuid;

/// An outgoing request as seen by analytics.
pub trait TrackedRequest {
    /// When the request was sent (ms since epoch).
    fn start_time(&self) -> i64;

    /// Identifier correlating this request with its response record.
    fn tracking_id(&self) -> &str;

    /// Size of the request body, if there is one.
    fn body_len(&self) -> Option<usize> {
        None
    }

    /// Attach a header before transmission.
    fn set_header(&mut self, name: &str, value: String);
}

/// A received response as seen by analytics.
pub trait ReceivedResponse {
    fn payload(&self) -> Option<&[u8]>;

    fn status_code(&self) -> Option<u16>;

    fn headers(&self) -> &HashMap<String, String>;

    fn is_redirect(&self) -> bool;
}

#[derive(Debug, Clone, Default)]
pub struct Request {
    pub url: String,
    pub method: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
    /// Set when the request is sent
    pub start_time: i64,
    pub tracking_id: String,
}

impl Request {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            headers: HashMap::new(),
            body: None,
            start_time: 0,
            tracking_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Record the send time.
    pub fn mark_sent(&mut self, now_millis: i64) {
        self.start_time = now_millis;
    }
}

impl TrackedRequest for Request {
    fn start_time(&self) -> i64 {
        self.start_time
    }

    fn tracking_id(&self) -> &str {
        &self.tracking_id
    }

    fn body_len(&self) -> Option<usize> {
        self.body.as_ref().map(Vec::len)
    }

    fn set_header(&mut self, name: &str, value: String) {
        self.headers.insert(name.to_string(), value);
    }
}

#[derive(Debug, Clone, Default)]
pub struct Response {
    pub payload: Option<Vec<u8>>,
    pub status_code: Option<u16>,
    pub headers: HashMap<String, String>,
    pub is_redirect: bool,
}

impl Response {
    pub fn new(status_code: u16, payload: Option<Vec<u8>>) -> Self {
        Self {
            payload,
            status_code: Some(status_code),
            headers: HashMap::new(),
            is_redirect: false,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

impl ReceivedResponse for Response {
    fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    fn is_redirect(&self) -> bool {
        self.is_redirect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request = Request::get("http://example.com");
        assert_eq!(request.method, "GET");
        assert_eq!(request.start_time(), 0);
        assert!(!request.tracking_id().is_empty());
        assert_eq!(request.body_len(), None);
    }

    #[test]
    fn test_request_tracking_ids_unique() {
        assert_ne!(
            Request::get("http://a").tracking_id,
            Request::get("http://a").tracking_id
        );
    }

    #[test]
    fn test_request_body_and_headers() {
        let mut request = Request::new("POST", "http://example.com").with_body("abc");
        request.mark_sent(123);
        request.set_header("x-test", "1".to_string());

        assert_eq!(request.body_len(), Some(3));
        assert_eq!(request.start_time(), 123);
        assert_eq!(request.headers.get("x-test"), Some(&"1".to_string()));
    }

    #[test]
    fn test_response_accessors() {
        let response = Response::new(200, Some(b"hello".to_vec())).with_header("key", "value");
        assert_eq!(response.payload(), Some(&b"hello"[..]));
        assert_eq!(response.status_code(), Some(200));
        assert_eq!(response.headers().get("key"), Some(&"value".to_string()));
        assert!(!response.is_redirect());
    }
}
