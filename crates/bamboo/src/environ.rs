//! The gateway request environment.
//!
//! An [`Environ`] is the CGI-style variable map a WSGI-style server hands to
//! the application for every request, plus the request body stream. The
//! application converts it into a [`RequestInfo`] before dispatch.
//!
//! Recognised keys:
//!
//! | Key | Meaning |
//! |-----|---------|
//! | `REQUEST_METHOD` | HTTP method (required, any case) |
//! | `PATH_INFO` | request path, not yet percent-decoded (empty means `/`) |
//! | `QUERY_STRING` | raw query string |
//! | `SERVER_PROTOCOL` | e.g. `HTTP/1.1` |
//! | `wsgi.url_scheme` | `http` or `https` |
//! | `REMOTE_ADDR` / `REMOTE_PORT` | client address |
//! | `SERVER_NAME` / `SERVER_PORT` | server address |
//! | `CONTENT_TYPE` / `CONTENT_LENGTH` | the matching request headers |
//! | `HTTP_*` | other request headers, `_` mapped to `-` |

use std::collections::BTreeMap;
use std::fmt;
use std::io::{Cursor, Read};

use bamboo_core::{BodyReader, HostAddr, RequestInfo};
use http::Method;

use crate::error::EnvironError;

/// Key holding the HTTP method.
pub const REQUEST_METHOD: &str = "REQUEST_METHOD";
/// Key holding the request path.
pub const PATH_INFO: &str = "PATH_INFO";
/// Key holding the raw query string.
pub const QUERY_STRING: &str = "QUERY_STRING";
/// Key holding the protocol version.
pub const SERVER_PROTOCOL: &str = "SERVER_PROTOCOL";
/// Key holding the URL scheme.
pub const URL_SCHEME: &str = "wsgi.url_scheme";

const CONTENT_TYPE: &str = "CONTENT_TYPE";
const CONTENT_LENGTH: &str = "CONTENT_LENGTH";
const HEADER_PREFIX: &str = "HTTP_";

/// A request environment as passed by the gateway server.
///
/// # Example
///
/// ```
/// use bamboo::Environ;
///
/// let environ = Environ::for_request("GET", "/users/42")
///     .with("QUERY_STRING", "expand=true")
///     .with_header("Accept", "application/json");
///
/// assert_eq!(environ.get("HTTP_ACCEPT"), Some("application/json"));
///
/// let request = environ.into_request().unwrap();
/// assert_eq!(request.path(), "/users/42");
/// assert_eq!(request.header("accept"), Some("application/json"));
/// ```
#[derive(Default)]
pub struct Environ {
    vars: BTreeMap<String, String>,
    input: Option<BodyReader>,
}

impl Environ {
    /// Creates an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an environment for `method` and `path` with HTTP/1.1 over `http`.
    #[must_use]
    pub fn for_request(method: &str, path: &str) -> Self {
        Self::new()
            .with(REQUEST_METHOD, method)
            .with(PATH_INFO, path)
            .with(SERVER_PROTOCOL, "HTTP/1.1")
            .with(URL_SCHEME, "http")
    }

    /// Sets a variable.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Sets a variable, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets a request header under its CGI key.
    ///
    /// Repeated headers are joined with `", "`.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        let key = header_key(name);
        match self.vars.get_mut(&key) {
            Some(existing) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            None => {
                self.vars.insert(key, value.to_string());
            }
        }
        self
    }

    /// Sets the request body stream.
    #[must_use]
    pub fn with_input(mut self, input: impl Read + Send + 'static) -> Self {
        self.input = Some(Box::new(input));
        self
    }

    /// Sets a buffered request body and its `CONTENT_LENGTH`.
    #[must_use]
    pub fn with_input_bytes(self, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        self.with(CONTENT_LENGTH, body.len().to_string())
            .with_input(Cursor::new(body))
    }

    /// Returns a variable.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Iterates all variables in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Converts the environment into request metadata.
    ///
    /// # Errors
    ///
    /// Returns [`EnvironError`] if the method is missing or malformed.
    pub fn into_request(mut self) -> Result<RequestInfo, EnvironError> {
        let method = self
            .vars
            .get(REQUEST_METHOD)
            .ok_or(EnvironError::MissingMethod)?;
        let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .map_err(|_| EnvironError::InvalidMethod(method.clone()))?;

        let path = match self.get(PATH_INFO) {
            None | Some("") => "/",
            Some(path) => path,
        };

        let mut request = RequestInfo::new(method, path);
        if let Some(query) = self.get(QUERY_STRING) {
            request = request.with_query_string(query);
        }
        if let Some(version) = self.get(SERVER_PROTOCOL) {
            request = request.with_http_version(version);
        }
        if let Some(scheme) = self.get(URL_SCHEME) {
            request = request.with_scheme(scheme);
        }
        if let Some(addr) = self.address("REMOTE_ADDR", "REMOTE_PORT") {
            request = request.with_client_addr(addr);
        }
        if let Some(addr) = self.address("SERVER_NAME", "SERVER_PORT") {
            request = request.with_server_addr(addr);
        }

        for (key, value) in &self.vars {
            if let Some(name) = header_name(key) {
                request = request.with_header(&name, value);
            }
        }

        if let Some(input) = self.input.take() {
            request = request.with_body(input);
        }
        Ok(request)
    }

    fn address(&self, host_key: &str, port_key: &str) -> Option<HostAddr> {
        let host = self.get(host_key).filter(|h| !h.is_empty())?;
        let port = self.get(port_key).and_then(|p| p.parse().ok());
        Some(HostAddr::new(host, port))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environ {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut environ = Self::new();
        environ.extend(iter);
        environ
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Environ {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

impl fmt::Debug for Environ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environ")
            .field("vars", &self.vars)
            .field("input", &self.input.as_ref().map(|_| ".."))
            .finish()
    }
}

fn header_key(name: &str) -> String {
    let upper = name.trim().to_ascii_uppercase().replace('-', "_");
    if upper == CONTENT_TYPE || upper == CONTENT_LENGTH {
        upper
    } else {
        format!("{HEADER_PREFIX}{upper}")
    }
}

fn header_name(key: &str) -> Option<String> {
    match key {
        CONTENT_TYPE => Some("content-type".to_string()),
        CONTENT_LENGTH => Some("content-length".to_string()),
        _ => key
            .strip_prefix(HEADER_PREFIX)
            .filter(|rest| !rest.is_empty())
            .map(|rest| rest.to_ascii_lowercase().replace('_', "-")),
    }
}
