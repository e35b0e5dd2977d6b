//! Per-request context.
//!
//! The [`Context`] bridges incoming request data and outgoing response
//! construction. One is created per dispatched request and is never shared
//! across requests. Endpoint callbacks receive it mutably; factories get a
//! read-only view.

use std::fmt;
use std::io::Read;

use bamboo_router::{ParamValue, ParameterBindings};
use bytes::Bytes;
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ContextError;
use crate::request::{BodyReader, ContentType, HostAddr, RequestInfo};
use crate::response::JSON_CONTENT_TYPE;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which makes it ideal for request tracking
/// and log correlation.
///
/// # Example
///
/// ```
/// use bamboo_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A lazily produced response body.
pub type BodyStream = Box<dyn Iterator<Item = Bytes> + Send>;

/// A response body.
pub enum ResponseBody {
    /// A fully buffered body.
    Bytes(Bytes),
    /// A lazy sequence of chunks.
    Stream(BodyStream),
}

impl ResponseBody {
    /// Length of a buffered body; `None` for streams.
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Bytes(bytes) => Some(bytes.len()),
            Self::Stream(_) => None,
        }
    }

    /// Returns true for an empty buffered body.
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }
}

impl Default for ResponseBody {
    fn default() -> Self {
        Self::Bytes(Bytes::new())
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(bytes).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<Bytes> for ResponseBody {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

/// Accumulated response status, headers and body.
///
/// Headers keep insertion order and may repeat. The body can be set once.
#[derive(Debug)]
pub struct ResponseState {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Option<ResponseBody>,
}

impl Default for ResponseState {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: Vec::new(),
            body: None,
        }
    }
}

impl ResponseState {
    /// Creates a `200 OK` response with no headers and no body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the status. The last call wins.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
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

    /// Returns true if a header with this name was added (case-insensitive).
    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    /// Appends a header.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// The body, if one was set.
    pub fn body(&self) -> Option<&ResponseBody> {
        self.body.as_ref()
    }

    /// Returns true once a body has been set.
    pub const fn is_finalized(&self) -> bool {
        self.body.is_some()
    }

    /// Sets the body.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::ResponseAlreadyFinalized`] if a body was already set.
    pub fn set_body(&mut self, body: ResponseBody) -> Result<(), ContextError> {
        if self.body.is_some() {
            return Err(ContextError::ResponseAlreadyFinalized);
        }
        self.body = Some(body);
        Ok(())
    }

    /// Splits into status, headers and body (empty if never set).
    pub fn into_parts(self) -> (StatusCode, Vec<(String, String)>, ResponseBody) {
        (self.status, self.headers, self.body.unwrap_or_default())
    }
}

/// Per-request state handed to endpoints.
///
/// # Example
///
/// ```
/// use bamboo_core::{Context, RequestInfo};
/// use http::{Method, StatusCode};
///
/// let request = RequestInfo::new(Method::GET, "/search").with_query_string("q=rust&q=wsgi");
/// let mut ctx = Context::new(request, Default::default());
///
/// assert_eq!(ctx.query("q").as_deref(), Some("rust"));
/// assert_eq!(ctx.query_all("q"), vec!["rust", "wsgi"]);
///
/// ctx.set_status(StatusCode::CREATED);
/// ctx.add_header("X-Test", "1");
/// ctx.send_body("ok").unwrap();
/// assert!(ctx.send_body("again").is_err());
/// ```
pub struct Context {
    request_id: RequestId,
    request: RequestInfo,
    params: ParameterBindings,
    body: Option<BodyReader>,
    body_read: bool,
    response: ResponseState,
}

impl Context {
    /// Creates a context with a fresh request ID.
    pub fn new(request: RequestInfo, params: ParameterBindings) -> Self {
        Self::with_request_id(RequestId::new(), request, params)
    }

    /// Creates a context with the given request ID.
    pub fn with_request_id(
        request_id: RequestId,
        mut request: RequestInfo,
        params: ParameterBindings,
    ) -> Self {
        let body = request.body.take();
        Self {
            request_id,
            request,
            params,
            body,
            body_read: false,
            response: ResponseState::new(),
        }
    }

    /// The request ID.
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// The request metadata.
    pub fn request(&self) -> &RequestInfo {
        &self.request
    }

    /// Request method.
    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// Raw request path.
    pub fn path(&self) -> &str {
        self.request.path()
    }

    /// First value of the named request header (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.header(name)
    }

    /// Protocol version string, e.g. `HTTP/1.1`.
    pub fn http_version(&self) -> &str {
        self.request.http_version()
    }

    /// URL scheme.
    pub fn scheme(&self) -> &str {
        self.request.scheme()
    }

    /// Client address.
    pub fn client_addr(&self) -> Option<&HostAddr> {
        self.request.client_addr()
    }

    /// Server address.
    pub fn server_addr(&self) -> Option<&HostAddr> {
        self.request.server_addr()
    }

    /// The `Host` header split into host and port.
    pub fn host_addr(&self) -> Option<HostAddr> {
        self.header("host").map(HostAddr::parse)
    }

    /// The parsed `Content-Type` header.
    pub fn content_type(&self) -> Option<ContentType> {
        self.header("content-type").and_then(ContentType::parse)
    }

    /// The `Content-Length` header, if present and numeric.
    pub fn content_length(&self) -> Option<u64> {
        self.header("content-length")
            .and_then(|v| v.trim().parse().ok())
    }

    /// All query pairs in order of appearance.
    ///
    /// An undecodable query string yields no pairs.
    pub fn queries(&self) -> Vec<(String, String)> {
        serde_urlencoded::from_str(self.request.query_string()).unwrap_or_default()
    }

    /// First value of a query parameter.
    pub fn query(&self, name: &str) -> Option<String> {
        self.queries()
            .into_iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Every value of a query parameter.
    pub fn query_all(&self, name: &str) -> Vec<String> {
        self.queries()
            .into_iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v)
            .collect()
    }

    /// Bound path parameters.
    pub fn params(&self) -> &ParameterBindings {
        &self.params
    }

    /// A bound path parameter.
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    /// A bound `string` or `path` parameter.
    pub fn param_str(&self, name: &str) -> Option<&str> {
        self.params.get_str(name)
    }

    /// A bound `int` parameter.
    pub fn param_int(&self, name: &str) -> Option<i64> {
        self.params.get_int(name)
    }

    /// A bound `float` parameter.
    pub fn param_float(&self, name: &str) -> Option<f64> {
        self.params.get_float(name)
    }

    /// Reads the whole request body.
    ///
    /// Reads at most `Content-Length` bytes when that header is present. A
    /// request without a body reads as empty.
    ///
    /// # Errors
    ///
    /// [`ContextError::BodyAlreadyRead`] on the second call, or
    /// [`ContextError::BodyRead`] if the stream fails.
    pub fn read_body(&mut self) -> Result<Bytes, ContextError> {
        if self.body_read {
            return Err(ContextError::BodyAlreadyRead);
        }
        self.body_read = true;

        let Some(reader) = self.body.take() else {
            return Ok(Bytes::new());
        };
        let mut reader: BodyReader = match self.content_length() {
            Some(limit) => Box::new(reader.take(limit)),
            None => reader,
        };
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .map_err(ContextError::BodyRead)?;
        Ok(Bytes::from(buf))
    }

    /// The response accumulated so far.
    pub fn response(&self) -> &ResponseState {
        &self.response
    }

    /// Mutable access to the response.
    pub fn response_mut(&mut self) -> &mut ResponseState {
        &mut self.response
    }

    /// Sets the response status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.response.set_status(status);
    }

    /// Appends a response header.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.response.add_header(name, value);
    }

    /// Appends a header with MIME-style parameters, e.g.
    /// `Content-Disposition: attachment; filename=a.txt`.
    pub fn add_header_with_params(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        params: &[(&str, &str)],
    ) {
        let mut value = value.into();
        for (key, val) in params {
            value.push_str("; ");
            value.push_str(key);
            value.push('=');
            value.push_str(val);
        }
        self.response.add_header(name, value);
    }

    /// Appends several headers.
    pub fn add_headers<I, N, V>(&mut self, headers: I)
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self.response.add_header(name, value);
        }
    }

    /// Appends a `Content-Type` header.
    pub fn set_content_type(&mut self, content_type: &ContentType) {
        self.response
            .add_header("Content-Type", content_type.to_string());
    }

    /// Sets a buffered body.
    ///
    /// # Errors
    ///
    /// [`ContextError::ResponseAlreadyFinalized`] if a body was already set.
    pub fn send_body(&mut self, body: impl Into<Bytes>) -> Result<(), ContextError> {
        self.response.set_body(ResponseBody::Bytes(body.into()))
    }

    /// Sets a streaming body.
    ///
    /// # Errors
    ///
    /// [`ContextError::ResponseAlreadyFinalized`] if a body was already set.
    pub fn send_stream<I>(&mut self, chunks: I) -> Result<(), ContextError>
    where
        I: IntoIterator<Item = Bytes>,
        I::IntoIter: Send + 'static,
    {
        self.response
            .set_body(ResponseBody::Stream(Box::new(chunks.into_iter())))
    }

    /// Sets the status and an empty body.
    ///
    /// # Errors
    ///
    /// [`ContextError::ResponseAlreadyFinalized`] if a body was already set.
    pub fn send_only_status(&mut self, status: StatusCode) -> Result<(), ContextError> {
        self.response.set_body(ResponseBody::default())?;
        self.response.set_status(status);
        Ok(())
    }

    /// Serializes `value` as a JSON body.
    ///
    /// # Errors
    ///
    /// [`ContextError::Serialize`] if serialization fails, or
    /// [`ContextError::ResponseAlreadyFinalized`] if a body was already set.
    pub fn send_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ContextError> {
        if self.response.is_finalized() {
            return Err(ContextError::ResponseAlreadyFinalized);
        }
        let body = serde_json::to_vec(value).map_err(ContextError::Serialize)?;
        self.response.add_header("Content-Type", JSON_CONTENT_TYPE);
        self.response.set_body(ResponseBody::Bytes(body.into()))
    }

    /// Consumes the context, returning the response.
    pub fn into_response(self) -> ResponseState {
        self.response
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("request_id", &self.request_id)
            .field("request", &self.request)
            .field("params", &self.params)
            .field("body_read", &self.body_read)
            .field("response", &self.response)
            .finish_non_exhaustive()
    }
}
