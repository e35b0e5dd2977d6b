//! Request metadata.
//!
//! [`RequestInfo`] is the immutable snapshot of an incoming request that the
//! gateway boundary hands to the dispatcher. The body stream travels with it
//! and is moved into the [`Context`](crate::Context) for single consumption.

use std::fmt;
use std::io::Read;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Method;

/// A readable request body stream.
pub type BodyReader = Box<dyn Read + Send>;

/// A host and optional port, as found in `Host` or the gateway environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostAddr {
    /// Host name or address.
    pub host: String,
    /// Port, if known.
    pub port: Option<u16>,
}

impl HostAddr {
    /// Creates an address.
    pub fn new(host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parses `host[:port]`, including bracketed IPv6 literals.
    ///
    /// ```
    /// use bamboo_core::HostAddr;
    ///
    /// assert_eq!(HostAddr::parse("example.com:8080"), HostAddr::new("example.com", Some(8080)));
    /// assert_eq!(HostAddr::parse("[::1]:443"), HostAddr::new("[::1]", Some(443)));
    /// assert_eq!(HostAddr::parse("localhost"), HostAddr::new("localhost", None));
    /// ```
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        let split_at = if value.starts_with('[') {
            value.find("]:").map(|i| i + 1)
        } else if value.matches(':').count() == 1 {
            value.find(':')
        } else {
            None
        };

        match split_at {
            Some(i) => {
                let (host, port) = value.split_at(i);
                match port[1..].parse() {
                    Ok(port) => Self::new(host, Some(port)),
                    Err(_) => Self::new(value, None),
                }
            }
            None => Self::new(value, None),
        }
    }
}

impl fmt::Display for HostAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{port}", self.host),
            None => f.write_str(&self.host),
        }
    }
}

/// A parsed `Content-Type` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Lower-cased media type, e.g. `text/html`.
    pub media_type: String,
    /// The `charset` parameter.
    pub charset: Option<String>,
    /// The `boundary` parameter.
    pub boundary: Option<String>,
}

impl ContentType {
    /// Creates a content type without parameters.
    pub fn new(media_type: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            charset: None,
            boundary: None,
        }
    }

    /// Sets the charset.
    #[must_use]
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Sets the multipart boundary.
    #[must_use]
    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = Some(boundary.into());
        self
    }

    /// Parses a header value such as `text/plain; charset=UTF-8`.
    ///
    /// Returns `None` for an empty media type.
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.split(';');
        let media_type = parts.next()?.trim().to_ascii_lowercase();
        if media_type.is_empty() {
            return None;
        }

        let mut parsed = Self::new(media_type);
        for param in parts {
            let Some((key, val)) = param.split_once('=') else {
                continue;
            };
            let val = val.trim().trim_matches('"').to_string();
            match key.trim().to_ascii_lowercase().as_str() {
                "charset" => parsed.charset = Some(val),
                "boundary" => parsed.boundary = Some(val),
                _ => {}
            }
        }
        Some(parsed)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.media_type)?;
        if let Some(charset) = &self.charset {
            write!(f, "; charset={charset}")?;
        }
        if let Some(boundary) = &self.boundary {
            write!(f, "; boundary={boundary}")?;
        }
        Ok(())
    }
}

/// Immutable metadata for one request.
///
/// # Example
///
/// ```
/// use bamboo_core::RequestInfo;
/// use http::Method;
///
/// let request = RequestInfo::new(Method::POST, "/users")
///     .with_query_string("page=2")
///     .with_header("Content-Type", "application/json")
///     .with_body_bytes(b"{}".to_vec());
///
/// assert_eq!(request.header("content-type"), Some("application/json"));
/// assert_eq!(request.query_string(), "page=2");
/// ```
pub struct RequestInfo {
    method: Method,
    path: String,
    query_string: String,
    headers: HeaderMap,
    http_version: String,
    scheme: String,
    client_addr: Option<HostAddr>,
    server_addr: Option<HostAddr>,
    pub(crate) body: Option<BodyReader>,
}

impl RequestInfo {
    /// Creates request metadata for `method` and `path`.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query_string: String::new(),
            headers: HeaderMap::new(),
            http_version: "HTTP/1.1".to_string(),
            scheme: "http".to_string(),
            client_addr: None,
            server_addr: None,
            body: None,
        }
    }

    /// Sets the raw query string (without `?`).
    #[must_use]
    pub fn with_query_string(mut self, query: impl Into<String>) -> Self {
        self.query_string = query.into();
        self
    }

    /// Appends a header. Invalid names or values are skipped with a warning.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => tracing::warn!(header = name, "skipping malformed request header"),
        }
        self
    }

    /// Replaces all headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the protocol version, e.g. `HTTP/1.0`.
    #[must_use]
    pub fn with_http_version(mut self, version: impl Into<String>) -> Self {
        self.http_version = version.into();
        self
    }

    /// Sets the URL scheme.
    #[must_use]
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Sets the client address.
    #[must_use]
    pub fn with_client_addr(mut self, addr: HostAddr) -> Self {
        self.client_addr = Some(addr);
        self
    }

    /// Sets the server address.
    #[must_use]
    pub fn with_server_addr(mut self, addr: HostAddr) -> Self {
        self.server_addr = Some(addr);
        self
    }

    /// Attaches a body stream.
    #[must_use]
    pub fn with_body(mut self, body: impl Read + Send + 'static) -> Self {
        self.body = Some(Box::new(body));
        self
    }

    /// Attaches an in-memory body.
    #[must_use]
    pub fn with_body_bytes(self, body: impl Into<Vec<u8>>) -> Self {
        self.with_body(std::io::Cursor::new(body.into()))
    }

    /// Request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Raw request path, before percent-decoding.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string.
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    /// All request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of the named header (case-insensitive).
    ///
    /// Values that are not visible ASCII are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Protocol version string.
    pub fn http_version(&self) -> &str {
        &self.http_version
    }

    /// URL scheme.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Client address, if the gateway supplied one.
    pub fn client_addr(&self) -> Option<&HostAddr> {
        self.client_addr.as_ref()
    }

    /// Server address, if the gateway supplied one.
    pub fn server_addr(&self) -> Option<&HostAddr> {
        self.server_addr.as_ref()
    }
}

impl fmt::Debug for RequestInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestInfo")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query_string", &self.query_string)
            .field("headers", &self.headers)
            .field("http_version", &self.http_version)
            .field("scheme", &self.scheme)
            .field("client_addr", &self.client_addr)
            .field("server_addr", &self.server_addr)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}
