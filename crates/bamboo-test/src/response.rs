//! Test response wrapper.

use std::fmt;

use bytes::Bytes;
use http::{header, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::TestError;

/// A collected response with helper methods for assertions.
pub struct TestResponse {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl TestResponse {
    /// Creates a test response from the gateway status line, headers and
    /// collected body.
    pub fn from_gateway(
        status_line: &str,
        headers: Vec<(String, String)>,
        body: Bytes,
    ) -> Result<Self, TestError> {
        let code = status_line.split(' ').next().unwrap_or_default();
        let status = code
            .parse::<u16>()
            .ok()
            .and_then(|c| StatusCode::from_u16(c).ok())
            .ok_or_else(|| TestError::InvalidStatus(status_line.to_string()))?;
        Ok(Self::new(status, headers, body))
    }

    /// Creates a test response from raw parts.
    pub fn new(status: StatusCode, headers: Vec<(String, String)>, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the status code as a u16.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns true if the status is successful (2xx).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns true if the status is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// Returns true if the status is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// Returns the headers in the order the application sent them.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Gets the first value of a header (case-insensitive).
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        let name = name.as_ref();
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Gets every value of a header (case-insensitive).
    #[must_use]
    pub fn headers_all(&self, name: impl AsRef<str>) -> Vec<&str> {
        let name = name.as_ref();
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    /// Returns the Content-Length header value.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.header(header::CONTENT_LENGTH.as_str())
            .and_then(|v| v.parse().ok())
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as a string slice.
    pub fn text(&self) -> Result<&str, TestError> {
        Ok(std::str::from_utf8(&self.body)?)
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Deserializes the body as a JSON Value.
    pub fn json_value(&self) -> Result<serde_json::Value, TestError> {
        self.json()
    }

    // Assertion methods

    /// Asserts that the status code equals the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    #[track_caller]
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {} (body: {})",
            expected,
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts that the status code equals the expected u16 value.
    #[track_caller]
    pub fn assert_status_code(&self, expected: u16) -> &Self {
        assert_eq!(
            self.status.as_u16(),
            expected,
            "Expected status {}, got {}",
            expected,
            self.status.as_u16()
        );
        self
    }

    /// Asserts that the response is successful (2xx).
    #[track_caller]
    pub fn assert_success(&self) -> &Self {
        assert!(
            self.is_success(),
            "Expected success status, got {}",
            self.status
        );
        self
    }

    /// Asserts that a header exists with the expected value.
    #[track_caller]
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        let expected = expected.as_ref();
        let actual = self
            .header(name)
            .unwrap_or_else(|| panic!("Header '{}' not found", name));
        assert_eq!(
            actual, expected,
            "Header '{}': expected '{}', got '{}'",
            name, expected, actual
        );
        self
    }

    /// Asserts that a header is absent.
    #[track_caller]
    pub fn assert_no_header(&self, name: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        if let Some(value) = self.header(name) {
            panic!("Header '{}' should be absent, got '{}'", name, value);
        }
        self
    }

    /// Asserts that the Content-Type header starts with `expected`.
    #[track_caller]
    pub fn assert_content_type(&self, expected: impl AsRef<str>) -> &Self {
        let expected = expected.as_ref();
        let actual = self
            .content_type()
            .unwrap_or_else(|| panic!("Content-Type header not found"));
        assert!(
            actual.starts_with(expected),
            "Content-Type: expected '{}', got '{}'",
            expected,
            actual
        );
        self
    }

    /// Asserts that the body contains the expected substring.
    #[track_caller]
    pub fn assert_body_contains(&self, expected: impl AsRef<str>) -> &Self {
        let expected = expected.as_ref();
        let body = String::from_utf8_lossy(&self.body);
        assert!(
            body.contains(expected),
            "Body should contain '{}', got: {}",
            expected,
            body
        );
        self
    }

    /// Asserts that the body equals the expected string.
    #[track_caller]
    pub fn assert_body_eq(&self, expected: impl AsRef<str>) -> &Self {
        let body = String::from_utf8_lossy(&self.body);
        assert_eq!(body, expected.as_ref(), "Body mismatch");
        self
    }

    /// Asserts that the JSON body matches the expected value.
    #[track_caller]
    pub fn assert_json_eq(&self, expected: &serde_json::Value) -> &Self {
        let actual = self
            .json_value()
            .unwrap_or_else(|e| panic!("Body should be valid JSON: {e}"));
        assert_eq!(&actual, expected, "JSON body mismatch");
        self
    }

    /// Asserts that a JSON field exists and equals the expected value.
    ///
    /// `path` is dot-separated; numeric segments index arrays
    /// (`"items.0.name"`).
    #[track_caller]
    pub fn assert_json_field(&self, path: impl AsRef<str>, expected: &serde_json::Value) -> &Self {
        let path = path.as_ref();
        let json = self
            .json_value()
            .unwrap_or_else(|e| panic!("Body should be valid JSON: {e}"));
        let actual = json_path(&json, path)
            .unwrap_or_else(|| panic!("JSON path '{}' not found in: {:?}", path, json));
        assert_eq!(
            actual, expected,
            "JSON field '{}': expected {:?}, got {:?}",
            path, expected, actual
        );
        self
    }
}

impl fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

fn json_path<'a>(value: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    let mut current = value;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        current = match segment.parse::<usize>() {
            Ok(index) => current.get(index)?,
            Err(_) => current.get(segment)?,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(body: &'static str) -> TestResponse {
        TestResponse::new(
            StatusCode::OK,
            vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Set-Cookie".to_string(), "a=1".to_string()),
                ("set-cookie".to_string(), "b=2".to_string()),
            ],
            Bytes::from_static(body.as_bytes()),
        )
    }

    #[test]
    fn test_from_gateway_parses_status_line() {
        let response =
            TestResponse::from_gateway("201 Created", Vec::new(), Bytes::new()).unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = TestResponse::from_gateway("599 Unknown", Vec::new(), Bytes::new()).unwrap();
        assert_eq!(response.status_code(), 599);
    }

    #[test]
    fn test_from_gateway_rejects_garbage() {
        let err = TestResponse::from_gateway("OK", Vec::new(), Bytes::new()).unwrap_err();
        assert!(matches!(err, TestError::InvalidStatus(_)));
    }

    #[test]
    fn test_headers_case_insensitive() {
        let response = response("{}");
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.headers_all("SET-COOKIE"), vec!["a=1", "b=2"]);
        response.assert_no_header("Location");
    }

    #[test]
    fn test_json_path() {
        let value = json!({"items": [{"name": "a"}, {"name": "b"}]});
        assert_eq!(json_path(&value, "items.1.name"), Some(&json!("b")));
        assert_eq!(json_path(&value, "items.5"), None);
        assert_eq!(json_path(&value, ""), Some(&value));
    }

    #[test]
    fn test_json_assertions() {
        response(r#"{"user": {"id": 7}}"#)
            .assert_success()
            .assert_content_type("application/json")
            .assert_json_field("user.id", &json!(7))
            .assert_json_eq(&json!({"user": {"id": 7}}));
    }

    #[test]
    fn test_text_rejects_invalid_utf8() {
        let response = TestResponse::new(
            StatusCode::OK,
            Vec::new(),
            Bytes::from_static(&[0xff, 0xfe]),
        );
        assert!(matches!(response.text(), Err(TestError::Utf8(_))));
    }

    #[test]
    #[should_panic(expected = "Expected status 404 Not Found")]
    fn test_assert_status_panics() {
        response("{}").assert_status(StatusCode::NOT_FOUND);
    }
}
