//! Error response descriptors.
//!
//! An [`ErrorResponse`] is a complete response (status, extra headers, body)
//! that a handler returns to short-circuit dispatch. The dispatcher sends it
//! as-is instead of whatever the handler had accumulated so far. The same type
//! describes the framework-generated 404, 405 and 500 responses.

use bytes::Bytes;
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};

/// Content type used for JSON bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// A complete response used to short-circuit dispatch.
///
/// # Example
///
/// ```
/// use bamboo_core::{ApiError, ErrorResponse};
/// use http::StatusCode;
///
/// let moved = ErrorResponse::redirect(StatusCode::MOVED_PERMANENTLY, "/v2/users");
/// assert_eq!(moved.header("location"), Some("/v2/users"));
///
/// let api = ErrorResponse::api(
///     StatusCode::UNPROCESSABLE_ENTITY,
///     ApiError::new(1203).developer_message("name is required"),
/// );
/// assert_eq!(api.header("Content-Type"), Some("application/json; charset=utf-8"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl ErrorResponse {
    /// Creates an empty response with the given status.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// The framework 404 response.
    #[must_use]
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
    }

    /// The framework 500 response.
    #[must_use]
    pub fn internal_error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// The framework 405 response, listing `allowed` in an `Allow` header.
    #[must_use]
    pub fn method_not_allowed(allowed: &[Method]) -> Self {
        let mut names: Vec<&str> = Vec::with_capacity(allowed.len());
        for method in allowed {
            if !names.contains(&method.as_str()) {
                names.push(method.as_str());
            }
        }
        Self::new(StatusCode::METHOD_NOT_ALLOWED).with_header("Allow", names.join(", "))
    }

    /// A redirect to `location`.
    #[must_use]
    pub fn redirect(status: StatusCode, location: impl Into<String>) -> Self {
        Self::new(status).with_header("Location", location)
    }

    /// A JSON API error body.
    #[must_use]
    pub fn api(status: StatusCode, error: ApiError) -> Self {
        // Serializing a struct of strings and integers cannot fail.
        let body = serde_json::to_vec(&error).unwrap_or_default();
        Self::new(status)
            .with_header("Content-Type", JSON_CONTENT_TYPE)
            .with_body(body)
    }

    /// Appends a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Replaces the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// The status code.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Headers in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value of the named header (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Splits into status, headers and body.
    pub fn into_parts(self) -> (StatusCode, Vec<(String, String)>, Bytes) {
        (self.status, self.headers, self.body)
    }
}

impl Default for ErrorResponse {
    fn default() -> Self {
        Self::internal_error()
    }
}

/// Body of a JSON API error.
///
/// Serializes as `{"code", "developerMessage", "userMessage", "info"}`; unset
/// fields are `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Application-specific error code.
    pub code: Option<i64>,
    /// Message aimed at API consumers' developers.
    pub developer_message: Option<String>,
    /// Message that can be shown to end users.
    pub user_message: Option<String>,
    /// Further information, such as a documentation link.
    pub info: Option<String>,
}

impl ApiError {
    /// Creates an error with the given code.
    #[must_use]
    pub fn new(code: i64) -> Self {
        Self {
            code: Some(code),
            ..Self::default()
        }
    }

    /// Sets the developer message.
    #[must_use]
    pub fn developer_message(mut self, message: impl Into<String>) -> Self {
        self.developer_message = Some(message.into());
        self
    }

    /// Sets the user message.
    #[must_use]
    pub fn user_message(mut self, message: impl Into<String>) -> Self {
        self.user_message = Some(message.into());
        self
    }

    /// Sets the info field.
    #[must_use]
    pub fn info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let response = ErrorResponse::new(StatusCode::GONE);
        assert_eq!(response.status(), StatusCode::GONE);
        assert!(response.headers().is_empty());
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_method_not_allowed_dedups() {
        let response =
            ErrorResponse::method_not_allowed(&[Method::GET, Method::POST, Method::GET]);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.header("allow"), Some("GET, POST"));
    }

    #[test]
    fn test_redirect() {
        let response = ErrorResponse::redirect(StatusCode::SEE_OTHER, "/login");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.header("Location"), Some("/login"));
    }

    #[test]
    fn test_api_body() {
        let response = ErrorResponse::api(
            StatusCode::BAD_REQUEST,
            ApiError::new(42)
                .developer_message("missing field")
                .user_message("Please fill in the form"),
        );

        let json: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(json["code"], 42);
        assert_eq!(json["developerMessage"], "missing field");
        assert_eq!(json["userMessage"], "Please fill in the form");
        assert!(json["info"].is_null());
    }

    #[test]
    fn test_with_header_and_body() {
        let response = ErrorResponse::new(StatusCode::TOO_MANY_REQUESTS)
            .with_header("Retry-After", "30")
            .with_body("slow down");
        let (status, headers, body) = response.into_parts();
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(headers, vec![("Retry-After".to_string(), "30".to_string())]);
        assert_eq!(body, Bytes::from_static(b"slow down"));
    }
}
