//! Per-request dispatch.
//!
//! The [`Dispatcher`] takes one [`RequestInfo`] through route resolution,
//! method selection, endpoint execution and finalisation:
//!
//! ```text
//! Received → NotFound ──────────────────────────────┐
//!          → Matched → MethodNotAllowed ────────────┤
//!                    → Executing → Succeeded ───────┤
//!                                → Signalled ───────┤
//!                                → Failed (500) ────┴→ Finalized
//! ```
//!
//! Nothing raised by endpoint code, including panics, escapes `dispatch`.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use bamboo_core::{
    Context, EndpointFactory, ErrorResponse, HandlerError, RequestId, RequestInfo, ResponseBody,
};
use bamboo_router::{Resolved, RouteTable};
use bamboo_telemetry::metrics::{self as request_metrics, InFlightGuard, UNMATCHED_ROUTE};
use http::Method;
use tracing::{debug, error, info_span};

use crate::response::Response;

/// The registry type dispatch reads from.
pub type Routes = RouteTable<Box<dyn EndpointFactory>>;

/// Callback invoked once for every unhandled endpoint failure.
pub type ErrorHook = Box<dyn Fn(&FailureReport) + Send + Sync>;

/// Application-wide dispatch settings.
pub(crate) struct Settings {
    pub(crate) debug: bool,
    pub(crate) default_headers: Vec<(String, String)>,
    pub(crate) not_found: ErrorResponse,
    pub(crate) internal_error: ErrorResponse,
    pub(crate) error_hook: Option<ErrorHook>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            default_headers: Vec::new(),
            not_found: ErrorResponse::not_found(),
            internal_error: ErrorResponse::internal_error(),
            error_hook: None,
        }
    }
}

/// How a request left the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    BadRequest,
    NotFound,
    MethodNotAllowed,
    Signalled,
    Failed,
    Succeeded,
}

impl Outcome {
    const fn as_str(self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::NotFound => "not_found",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::Signalled => "signalled",
            Self::Failed => "failed",
            Self::Succeeded => "succeeded",
        }
    }
}

/// Details of an unhandled endpoint failure, passed to the error hook.
pub struct FailureReport {
    request_id: RequestId,
    method: Method,
    path: String,
    route: String,
    endpoint: &'static str,
    error: anyhow::Error,
}

impl FailureReport {
    /// The failing request's ID.
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// The request method.
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// The request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The matched route pattern.
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Type name of the endpoint that failed.
    pub const fn endpoint(&self) -> &'static str {
        self.endpoint
    }

    /// The failure.
    pub const fn error(&self) -> &anyhow::Error {
        &self.error
    }
}

impl fmt::Debug for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailureReport")
            .field("request_id", &self.request_id)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("route", &self.route)
            .field("endpoint", &self.endpoint)
            .field("error", &format_args!("{:#}", self.error))
            .finish()
    }
}

/// Dispatches requests against a route table.
///
/// Holds only shared references, so any number of dispatchers may run over
/// the same routes concurrently.
pub struct Dispatcher<'a> {
    routes: &'a Routes,
    settings: &'a Settings,
}

impl<'a> Dispatcher<'a> {
    pub(crate) const fn new(routes: &'a Routes, settings: &'a Settings) -> Self {
        Self { routes, settings }
    }

    /// Dispatches one request and returns its finalised response.
    pub fn dispatch(&self, request: RequestInfo) -> Response {
        let started = Instant::now();
        let _in_flight = InFlightGuard::new();
        let request_id = RequestId::new();

        let span = info_span!(
            "request",
            request_id = %request_id,
            http.method = %request.method(),
            http.path = %request.path(),
        );
        let _entered = span.enter();

        let (outcome, route, response) = self.execute(request_id, request);
        self.finish(outcome, route, Some(request_id), response, started)
    }

    /// Finalises a framework-generated response that never reached routing.
    pub(crate) fn reject(&self, response: ErrorResponse) -> Response {
        self.finish(
            Outcome::BadRequest,
            None,
            None,
            Response::from_error(response),
            Instant::now(),
        )
    }

    fn execute(
        &self,
        request_id: RequestId,
        request: RequestInfo,
    ) -> (Outcome, Option<&'a str>, Response) {
        let Some(Resolved {
            pattern,
            value: factory,
            bindings,
        }) = self.routes.resolve(request.path())
        else {
            debug!("No route matched");
            return (
                Outcome::NotFound,
                None,
                Response::from_error(self.settings.not_found.clone()),
            );
        };
        let route = pattern.as_str();

        if !factory.supports(request.method()) {
            return (
                Outcome::MethodNotAllowed,
                Some(route),
                self.method_not_allowed(route, &**factory),
            );
        }

        let mut ctx = Context::with_request_id(request_id, request, bindings);
        let result = panic::catch_unwind(AssertUnwindSafe(|| factory.dispatch(&mut ctx)));

        let failure = match result {
            Ok(Some(Ok(()))) => {
                return (
                    Outcome::Succeeded,
                    Some(route),
                    Response::from_state(ctx.into_response()),
                )
            }
            Ok(Some(Err(HandlerError::Respond(signal)))) => {
                debug!(route, status = signal.status().as_u16(), "Endpoint signalled a response");
                return (Outcome::Signalled, Some(route), Response::from_error(signal));
            }
            Ok(Some(Err(err))) => match err.into_failure() {
                Ok(failure) => failure,
                Err(signal) => {
                    return (Outcome::Signalled, Some(route), Response::from_error(signal))
                }
            },
            Ok(None) => {
                return (
                    Outcome::MethodNotAllowed,
                    Some(route),
                    self.method_not_allowed(route, &**factory),
                )
            }
            Err(payload) => anyhow::anyhow!("endpoint panicked: {}", panic_message(&*payload)),
        };

        let report = FailureReport {
            request_id,
            method: ctx.method().clone(),
            path: ctx.path().to_string(),
            route: route.to_string(),
            endpoint: factory.endpoint_name(),
            error: failure,
        };
        (Outcome::Failed, Some(route), self.internal_error(report))
    }

    fn method_not_allowed(&self, route: &str, factory: &dyn EndpointFactory) -> Response {
        let allowed = factory.allowed_methods();
        debug!(route, allowed = ?allowed, "Method not allowed");
        Response::from_error(ErrorResponse::method_not_allowed(&allowed))
    }

    fn internal_error(&self, report: FailureReport) -> Response {
        let message = format!("{:#}", report.error);
        bamboo_telemetry::log_request_error!(report.route, message);
        request_metrics::record_failure(&report.route);

        if let Some(hook) = &self.settings.error_hook {
            if panic::catch_unwind(AssertUnwindSafe(|| hook(&report))).is_err() {
                error!("Error hook panicked");
            }
        }

        if self.settings.debug {
            let status = self.settings.internal_error.status();
            let body = format!("{:?}", report.error);
            return Response::from_error(
                ErrorResponse::new(status)
                    .with_header("Content-Type", "text/plain; charset=utf-8")
                    .with_body(body),
            );
        }
        Response::from_error(self.settings.internal_error.clone())
    }

    fn finish(
        &self,
        outcome: Outcome,
        route: Option<&str>,
        request_id: Option<RequestId>,
        mut response: Response,
        started: Instant,
    ) -> Response {
        for (name, value) in &self.settings.default_headers {
            if !response.has_header(name) {
                response.push_header(name.clone(), value.clone());
            }
        }
        response.retain_valid_headers();

        if let ResponseBody::Bytes(bytes) = response.body() {
            if !response.has_header("Content-Length") {
                let len = bytes.len().to_string();
                response.push_header("Content-Length", len);
            }
        }

        let status = response.status();
        let elapsed = started.elapsed();
        let route = route.unwrap_or(UNMATCHED_ROUTE);
        request_metrics::record_request(route, status.as_u16(), elapsed);
        response.set_origin(route, request_id);

        let duration_ms = elapsed.as_secs_f64() * 1000.0;
        debug!(outcome = outcome.as_str(), "Dispatch finished");
        bamboo_telemetry::log_request_complete!(route, status.as_u16(), duration_ms);
        response
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
