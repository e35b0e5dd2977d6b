//! Finalised responses handed back to the gateway.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use bamboo_core::{BodyStream, ErrorResponse, RequestId, ResponseBody, ResponseState};
use bamboo_telemetry::metrics::{self as request_metrics, UNMATCHED_ROUTE};
use bytes::{Bytes, BytesMut};
use http::{HeaderName, HeaderValue, StatusCode};
use tracing::{error, warn};

use crate::dispatcher::panic_message;

/// A finalised response: status, ordered headers and a body.
///
/// Produced by the dispatcher for every request, including framework-generated
/// 400, 404, 405 and 500 responses.
pub struct Response {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: ResponseBody,
    origin: Origin,
}

/// Which request a body belongs to, for failures raised while streaming.
#[derive(Debug, Clone)]
struct Origin {
    route: String,
    request_id: Option<RequestId>,
}

impl Default for Origin {
    fn default() -> Self {
        Self {
            route: UNMATCHED_ROUTE.to_string(),
            request_id: None,
        }
    }
}

impl Response {
    pub(crate) fn from_state(state: ResponseState) -> Self {
        let (status, headers, body) = state.into_parts();
        Self {
            status,
            headers,
            body,
            origin: Origin::default(),
        }
    }

    pub(crate) fn from_error(error: ErrorResponse) -> Self {
        let (status, headers, body) = error.into_parts();
        Self {
            status,
            headers,
            body: ResponseBody::Bytes(body),
            origin: Origin::default(),
        }
    }

    pub(crate) fn set_origin(&mut self, route: &str, request_id: Option<RequestId>) {
        self.origin = Origin {
            route: route.to_string(),
            request_id,
        };
    }

    /// The status code.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// The gateway status line, e.g. `"201 Created"`.
    pub fn status_line(&self) -> String {
        format!(
            "{} {}",
            self.status.as_str(),
            self.status.canonical_reason().unwrap_or("Unknown")
        )
    }

    /// Headers in the order they will be sent.
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

    /// Every value of the named header (case-insensitive).
    pub fn header_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Returns true if the named header is present.
    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    pub(crate) fn push_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Drops headers that are not valid on the wire, such as a value
    /// containing CR or LF.
    pub(crate) fn retain_valid_headers(&mut self) {
        self.headers.retain(|(name, value)| {
            let valid = HeaderName::from_bytes(name.as_bytes()).is_ok()
                && HeaderValue::from_str(value).is_ok();
            if !valid {
                warn!(header = %name.escape_debug(), "Dropping malformed response header");
            }
            valid
        });
    }

    /// The body.
    pub const fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Splits into status, headers and a chunk iterator.
    pub fn into_parts(self) -> (StatusCode, Vec<(String, String)>, Body) {
        (self.status, self.headers, Body::new(self.body, self.origin))
    }

    /// The body as a chunk iterator.
    pub fn into_body(self) -> Body {
        Body::new(self.body, self.origin)
    }

    /// Drains the body into one buffer.
    pub fn into_bytes(self) -> Bytes {
        let mut buf = BytesMut::new();
        for chunk in self.into_body() {
            buf.extend_from_slice(&chunk);
        }
        buf.freeze()
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .finish()
    }
}

/// The response body as the iterable of byte chunks a gateway expects.
///
/// A buffered body yields one chunk, or none when empty. A panic while
/// producing a streamed chunk is logged, counted as a failure and ends the
/// body early; the status and headers are already on the wire by then.
pub struct Body {
    inner: BodyInner,
    origin: Origin,
}

enum BodyInner {
    Buffered(Option<Bytes>),
    Stream(BodyStream),
}

impl Body {
    fn new(body: ResponseBody, origin: Origin) -> Self {
        let inner = match body {
            ResponseBody::Bytes(bytes) => BodyInner::Buffered(Some(bytes)),
            ResponseBody::Stream(stream) => BodyInner::Stream(stream),
        };
        Self { inner, origin }
    }
}

impl Iterator for Body {
    type Item = Bytes;

    fn next(&mut self) -> Option<Bytes> {
        let stream = match &mut self.inner {
            BodyInner::Buffered(bytes) => return bytes.take().filter(|b| !b.is_empty()),
            BodyInner::Stream(stream) => stream,
        };

        match panic::catch_unwind(AssertUnwindSafe(|| stream.next())) {
            Ok(chunk) => chunk,
            Err(payload) => {
                let request_id = self.origin.request_id.map(|id| id.to_string());
                error!(
                    route = %self.origin.route,
                    request_id = request_id.as_deref().unwrap_or("-"),
                    panic = panic_message(&*payload),
                    "Response body panicked, ending body early"
                );
                request_metrics::record_failure(&self.origin.route);
                self.inner = BodyInner::Buffered(None);
                None
            }
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            BodyInner::Buffered(bytes) => f.debug_tuple("Body").field(bytes).finish(),
            BodyInner::Stream(_) => f.write_str("Body(Stream)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line() {
        let response = Response::from_error(ErrorResponse::new(StatusCode::CREATED));
        assert_eq!(response.status_line(), "201 Created");

        let custom = StatusCode::from_u16(599).unwrap();
        let response = Response::from_error(ErrorResponse::new(custom));
        assert_eq!(response.status_line(), "599 Unknown");
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut response = Response::from_error(ErrorResponse::not_found());
        response.push_header("Set-Cookie", "a=1");
        response.push_header("set-cookie", "b=2");
        assert_eq!(response.header("SET-COOKIE"), Some("a=1"));
        assert_eq!(response.header_all("Set-Cookie"), vec!["a=1", "b=2"]);
        assert!(!response.has_header("Location"));
    }

    #[test]
    fn test_empty_buffered_body_yields_nothing() {
        let response = Response::from_error(ErrorResponse::not_found());
        assert_eq!(response.into_body().count(), 0);
    }

    #[test]
    fn test_malformed_headers_dropped() {
        let mut response = Response::from_error(ErrorResponse::new(StatusCode::OK));
        response.push_header("X-Good", "yes");
        response.push_header("X-Split", "a\r\nSet-Cookie: evil=1");
        response.push_header("bad name", "v");
        response.retain_valid_headers();
        assert_eq!(
            response.headers(),
            &[("X-Good".to_string(), "yes".to_string())]
        );
    }

    #[test]
    fn test_stream_panic_ends_body() {
        let mut state = ResponseState::new();
        let chunks: BodyStream = Box::new((0..3).map(|i| {
            assert!(i < 1, "chunk {i} exploded");
            Bytes::from_static(b"a")
        }));
        state.set_body(ResponseBody::Stream(chunks)).unwrap();

        let mut body = Response::from_state(state).into_body();
        assert_eq!(body.next(), Some(Bytes::from_static(b"a")));
        assert_eq!(body.next(), None);
        assert_eq!(body.next(), None);
    }

    #[test]
    fn test_stream_body_chunks() {
        let mut state = ResponseState::new();
        let chunks: BodyStream = Box::new(
            vec![Bytes::from_static(b"ab"), Bytes::from_static(b"cd")].into_iter(),
        );
        state.set_body(ResponseBody::Stream(chunks)).unwrap();

        let response = Response::from_state(state);
        assert_eq!(response.body().len(), None);
        assert_eq!(response.into_bytes(), Bytes::from_static(b"abcd"));
    }
}
