//! Test request building.

use bamboo::Environ;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;

use crate::error::TestError;

/// A test request that can be sent to a [`TestClient`](crate::TestClient).
#[derive(Debug)]
pub struct TestRequest {
    /// HTTP method
    pub method: Method,
    /// Raw, still percent-encoded path
    pub path: String,
    /// Raw query string without the leading `?`
    pub query: String,
    /// Request headers
    pub headers: HeaderMap,
    /// Request body
    pub body: Option<Bytes>,
}

impl TestRequest {
    /// Creates a new GET request.
    pub fn get(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::GET, uri)
    }

    /// Creates a new POST request.
    pub fn post(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::POST, uri)
    }

    /// Creates a new PUT request.
    pub fn put(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PUT, uri)
    }

    /// Creates a new PATCH request.
    pub fn patch(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PATCH, uri)
    }

    /// Creates a new DELETE request.
    pub fn delete(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::DELETE, uri)
    }

    /// Creates a new OPTIONS request.
    pub fn options(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::OPTIONS, uri)
    }

    /// Creates a new HEAD request.
    pub fn head(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::HEAD, uri)
    }

    /// Converts this request into a gateway environment.
    ///
    /// A request without a body gets no input stream, so reading the body
    /// yields nothing.
    pub fn into_environ(self) -> Environ {
        let mut environ = Environ::for_request(self.method.as_str(), &self.path);
        if !self.query.is_empty() {
            environ.set("QUERY_STRING", self.query);
        }
        for (name, value) in &self.headers {
            environ = environ.with_header(name.as_str(), &String::from_utf8_lossy(value.as_bytes()));
        }
        match self.body {
            Some(body) => environ.with_input_bytes(body.to_vec()),
            None => environ,
        }
    }
}

/// Builder for constructing test requests.
///
/// Invalid input is remembered and reported by [`build`](Self::build).
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    path: String,
    query: Vec<String>,
    headers: HeaderMap,
    body: Option<Bytes>,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a new request builder.
    ///
    /// A query string in `uri` is kept and extended by [`query`](Self::query).
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        let uri = uri.as_ref();
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (uri, None),
        };
        Self {
            method,
            path: path.to_string(),
            query: query
                .filter(|q| !q.is_empty())
                .map(|q| vec![q.to_string()])
                .unwrap_or_default(),
            headers: HeaderMap::new(),
            body: None,
            error: None,
        }
    }

    /// Appends a header to the request.
    ///
    /// Repeated names are kept and reach the endpoint joined with `", "`.
    ///
    /// # Example
    ///
    /// ```
    /// use bamboo_test::TestRequest;
    ///
    /// let request = TestRequest::get("/users")
    ///     .header("Authorization", "Bearer token")
    ///     .header("X-Request-ID", "12345")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(request.headers["x-request-id"], "12345");
    /// ```
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        let parsed = HeaderName::try_from(name)
            .map_err(|e| TestError::InvalidHeader(format!("{name}: {e}")))
            .and_then(|n| {
                HeaderValue::try_from(value.as_ref())
                    .map(|v| (n, v))
                    .map_err(|e| TestError::InvalidHeader(format!("{name}: {e}")))
            });
        match parsed {
            Ok((name, value)) => {
                self.headers.append(name, value);
            }
            Err(err) => self.fail(err),
        }
        self
    }

    /// Sets a typed header on the request, replacing earlier values.
    pub fn header_typed(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Appends a query pair, percent-encoding both sides.
    pub fn query(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.query.push(format!(
            "{}={}",
            urlencoding::encode(name.as_ref()),
            urlencoding::encode(value.as_ref())
        ));
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.headers.remove(header::CONTENT_TYPE);
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the Accept header.
    pub fn accept(self, accept: impl AsRef<str>) -> Self {
        self.header(header::ACCEPT.as_str(), accept)
    }

    /// Sets the Authorization header with a Bearer token.
    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        self.header(
            header::AUTHORIZATION.as_str(),
            format!("Bearer {}", token.as_ref()),
        )
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the request body as JSON.
    ///
    /// This also sets the `Content-Type` header to `application/json`.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.body = Some(Bytes::from(bytes));
                self.content_type("application/json")
            }
            Err(err) => {
                self.fail(err.into());
                self
            }
        }
    }

    /// Sets the request body as form-urlencoded.
    ///
    /// This also sets the `Content-Type` header to
    /// `application/x-www-form-urlencoded`.
    pub fn form<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_urlencoded::to_string(value) {
            Ok(encoded) => {
                self.body = Some(Bytes::from(encoded));
                self.content_type("application/x-www-form-urlencoded")
            }
            Err(err) => {
                self.fail(err.into());
                self
            }
        }
    }

    /// Builds the test request.
    pub fn build(self) -> Result<TestRequest, TestError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if !self.path.starts_with('/') {
            return Err(TestError::RequestBuild(format!(
                "path must start with '/': {:?}",
                self.path
            )));
        }

        Ok(TestRequest {
            method: self.method,
            path: self.path,
            query: self.query.join("&"),
            headers: self.headers,
            body: self.body,
        })
    }

    fn fail(&mut self, err: TestError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_request() {
        let request = TestRequest::get("/users").build().unwrap();
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.path, "/users");
        assert!(request.query.is_empty());
        assert!(request.body.is_none());
    }

    #[test]
    fn test_delete_request() {
        let request = TestRequest::delete("/users/123").build().unwrap();
        assert_eq!(request.method, Method::DELETE);
    }

    #[test]
    fn test_query_appends_to_uri_query() {
        let request = TestRequest::get("/search?page=2")
            .query("q", "a b&c")
            .build()
            .unwrap();
        assert_eq!(request.path, "/search");
        assert_eq!(request.query, "page=2&q=a%20b%26c");
    }

    #[test]
    fn test_repeated_header_is_kept() {
        let request = TestRequest::get("/")
            .header("Accept", "text/html")
            .header("accept", "application/json")
            .build()
            .unwrap();
        let values: Vec<_> = request.headers.get_all("accept").iter().collect();
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_invalid_header_reported_at_build() {
        let err = TestRequest::get("/")
            .header("bad header", "x")
            .header("X-Ok", "fine")
            .build()
            .unwrap_err();
        assert!(matches!(err, TestError::InvalidHeader(_)));
    }

    #[test]
    fn test_relative_path_rejected() {
        let err = TestRequest::get("users").build().unwrap_err();
        assert!(matches!(err, TestError::RequestBuild(_)));
    }

    #[test]
    fn test_bearer_token() {
        let request = TestRequest::get("/users")
            .bearer_token("my_token")
            .build()
            .unwrap();
        assert_eq!(request.headers["authorization"], "Bearer my_token");
    }

    #[test]
    fn test_json_body_replaces_content_type() {
        let request = TestRequest::post("/users")
            .content_type("text/plain")
            .json(&json!({"name": "Alice"}))
            .build()
            .unwrap();

        let types: Vec<_> = request.headers.get_all("content-type").iter().collect();
        assert_eq!(types, vec!["application/json"]);
        assert_eq!(request.body.unwrap().as_ref(), b"{\"name\":\"Alice\"}");
    }

    #[test]
    fn test_form_body() {
        let request = TestRequest::post("/login")
            .form(&[("user", "alice"), ("note", "a&b")])
            .build()
            .unwrap();
        assert_eq!(
            request.headers["content-type"],
            "application/x-www-form-urlencoded"
        );
        assert_eq!(request.body.unwrap().as_ref(), b"user=alice&note=a%26b");
    }

    #[test]
    fn test_into_environ() {
        let environ = TestRequest::post("/files/a%20b")
            .query("x", "1")
            .header("X-Trace", "t1")
            .content_type("text/plain")
            .body("hello")
            .build()
            .unwrap()
            .into_environ();

        assert_eq!(environ.get("REQUEST_METHOD"), Some("POST"));
        assert_eq!(environ.get("PATH_INFO"), Some("/files/a%20b"));
        assert_eq!(environ.get("QUERY_STRING"), Some("x=1"));
        assert_eq!(environ.get("HTTP_X_TRACE"), Some("t1"));
        assert_eq!(environ.get("CONTENT_TYPE"), Some("text/plain"));
        assert_eq!(environ.get("CONTENT_LENGTH"), Some("5"));
    }
}
