//! The application registry and gateway entry point.

use std::any::TypeId;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bamboo_config::AppConfig;
use bamboo_core::{factory, Context, Endpoint, EndpointFactory, ErrorResponse, RegistrationError, RequestInfo};
use http::StatusCode;
use tracing::{debug, warn};

use crate::dispatcher::{Dispatcher, FailureReport, Routes, Settings};
use crate::environ::Environ;
use crate::response::{Body, Response};

/// A Bamboo application: a route table plus global settings.
///
/// Routes are registered during setup with `&mut self`. The first request
/// freezes the application; registration afterwards fails with
/// [`RegistrationError::LateRegistration`]. Dispatch only reads shared
/// state, so an `Application` can serve from many threads at once.
///
/// # Example
///
/// ```
/// use bamboo::prelude::*;
///
/// struct Users;
///
/// impl Users {
///     fn get(&mut self, ctx: &mut Context) -> HandlerResult {
///         let id = ctx.param_int("id").unwrap_or_default();
///         ctx.send_json(&serde_json::json!({ "id": id }))?;
///         Ok(())
///     }
/// }
///
/// impl Endpoint for Users {
///     fn methods() -> MethodTable<Self> {
///         MethodTable::new().get(Self::get)
///     }
/// }
///
/// let mut app = Application::new();
/// app.route("/users/{id:int}", |_: &Context| Users).unwrap();
///
/// let response = app.handle(Environ::for_request("GET", "/users/7"));
/// assert_eq!(response.status_line(), "200 OK");
/// ```
pub struct Application {
    routes: Routes,
    settings: Settings,
    insert_version: bool,
    version_tag: String,
    frozen: AtomicBool,
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Application {
    /// Creates an application with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&AppConfig::default())
    }

    /// Creates an application from the `[app]` configuration section.
    ///
    /// The section is expected to have passed
    /// [`BambooConfig::validate`](bamboo_config::BambooConfig::validate).
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let settings = Settings {
            debug: config.debug,
            default_headers: config
                .default_headers
                .iter()
                .map(|h| (h.name.clone(), h.value.clone()))
                .collect(),
            ..Settings::default()
        };
        Self {
            routes: Routes::new(),
            settings,
            insert_version: config.insert_version,
            version_tag: config.version_tag.clone(),
            frozen: AtomicBool::new(false),
        }
    }

    /// Enables or disables failure details in 500 bodies.
    pub fn set_debug(&mut self, debug: bool) {
        self.settings.debug = debug;
    }

    /// Adds a header sent with every response unless the endpoint set it.
    pub fn add_default_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.settings
            .default_headers
            .push((name.into(), value.into()));
    }

    /// Replaces the response sent when no route matches.
    pub fn set_not_found_response(&mut self, response: ErrorResponse) {
        self.settings.not_found = response;
    }

    /// Replaces the response sent on an unhandled failure.
    pub fn set_internal_error_response(&mut self, response: ErrorResponse) {
        self.settings.internal_error = response;
    }

    /// Installs the hook called once per unhandled endpoint failure.
    pub fn set_error_hook<F>(&mut self, hook: F)
    where
        F: Fn(&FailureReport) + Send + Sync + 'static,
    {
        self.settings.error_hook = Some(Box::new(hook));
    }

    /// Registers a type-erased endpoint factory under `pattern`.
    pub fn register(
        &mut self,
        pattern: &str,
        factory: Box<dyn EndpointFactory>,
    ) -> Result<(), RegistrationError> {
        if self.is_frozen() {
            warn!(pattern, "Route registered after the application started serving");
            return Err(RegistrationError::late(pattern));
        }

        let endpoint = factory.endpoint_name();
        self.routes.register(pattern, factory)?;
        debug!(pattern, endpoint, "Registered route");
        Ok(())
    }

    /// Registers endpoint `E`, built per request by `build`, under `pattern`.
    ///
    /// Construction parameters are captured by the closure.
    pub fn route<E, F>(&mut self, pattern: &str, build: F) -> Result<(), RegistrationError>
    where
        E: Endpoint,
        F: Fn(&Context) -> E + Send + Sync + 'static,
    {
        self.register(pattern, factory(build))
    }

    /// Registers `pattern` once per version as `/{tag}{n}{pattern}`.
    ///
    /// With version insertion disabled, or no versions, `pattern` is
    /// registered unchanged. Registration stops at the first error; earlier
    /// versions stay registered.
    pub fn route_versioned<E, F>(
        &mut self,
        pattern: &str,
        versions: &[u32],
        build: F,
    ) -> Result<(), RegistrationError>
    where
        E: Endpoint,
        F: Fn(&Context) -> E + Send + Sync + 'static,
    {
        if !self.insert_version || versions.is_empty() {
            return self.route(pattern, build);
        }

        let build = Arc::new(build);
        for version in versions {
            let versioned = versioned_pattern(&self.version_tag, *version, pattern);
            let build = Arc::clone(&build);
            self.route(&versioned, move |ctx: &Context| build(ctx))?;
        }
        Ok(())
    }

    /// Patterns registered for endpoint type `E`, in registration order.
    pub fn patterns_for<E: Endpoint>(&self) -> Vec<&str> {
        let wanted = TypeId::of::<E>();
        self.routes
            .iter()
            .filter(|(_, factory)| factory.endpoint_type() == wanted)
            .map(|(pattern, _)| pattern.as_str())
            .collect()
    }

    /// The route table.
    pub const fn routes(&self) -> &Routes {
        &self.routes
    }

    /// Returns true once the application has handled a request.
    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    /// A dispatcher over this application's routes.
    ///
    /// Freezes the application.
    pub fn dispatcher(&self) -> Dispatcher<'_> {
        self.frozen.store(true, Ordering::Release);
        Dispatcher::new(&self.routes, &self.settings)
    }

    /// Dispatches already-parsed request metadata.
    pub fn dispatch(&self, request: RequestInfo) -> Response {
        self.dispatcher().dispatch(request)
    }

    /// Handles one gateway request.
    ///
    /// An environment without a usable method gets `400 Bad Request`.
    pub fn handle(&self, environ: Environ) -> Response {
        let dispatcher = self.dispatcher();
        match environ.into_request() {
            Ok(request) => dispatcher.dispatch(request),
            Err(err) => {
                warn!(error = %err, "Rejected malformed environ");
                dispatcher.reject(ErrorResponse::new(StatusCode::BAD_REQUEST))
            }
        }
    }

    /// The gateway calling convention.
    ///
    /// Calls `start_response` with the status line and headers, then returns
    /// the body as an iterator of byte chunks.
    pub fn call<S>(&self, environ: Environ, start_response: S) -> Body
    where
        S: FnOnce(&str, &[(String, String)]),
    {
        let response = self.handle(environ);
        let status_line = response.status_line();
        let (_, headers, body) = response.into_parts();
        start_response(&status_line, &headers);
        body
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("routes", &self.routes)
            .field("debug", &self.settings.debug)
            .field("default_headers", &self.settings.default_headers)
            .field("error_hook", &self.settings.error_hook.is_some())
            .field("frozen", &self.is_frozen())
            .finish_non_exhaustive()
    }
}

fn versioned_pattern(tag: &str, version: u32, pattern: &str) -> String {
    let rest = pattern.trim_start_matches('/');
    if rest.is_empty() {
        format!("/{tag}{version}")
    } else {
        format!("/{tag}{version}/{rest}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bamboo_core::{HandlerResult, MethodTable};

    struct Ping;

    impl Ping {
        fn get(&mut self, ctx: &mut Context) -> HandlerResult {
            ctx.send_body("pong")?;
            Ok(())
        }
    }

    impl Endpoint for Ping {
        fn methods() -> MethodTable<Self> {
            MethodTable::new().get(Self::get)
        }
    }

    struct Other;

    impl Other {
        fn post(&mut self, _ctx: &mut Context) -> HandlerResult {
            Ok(())
        }
    }

    impl Endpoint for Other {
        fn methods() -> MethodTable<Self> {
            MethodTable::new().post(Self::post)
        }
    }

    #[test]
    fn test_versioned_pattern() {
        assert_eq!(versioned_pattern("v", 2, "/users"), "/v2/users");
        assert_eq!(versioned_pattern("api", 1, "users/{id}"), "/api1/users/{id}");
        assert_eq!(versioned_pattern("v", 3, "/"), "/v3");
    }

    #[test]
    fn test_register_and_duplicate() {
        let mut app = Application::new();
        app.route("/ping", |_: &Context| Ping).unwrap();
        let err = app.route("/ping/", |_: &Context| Ping).unwrap_err();
        assert!(matches!(err, RegistrationError::Route(_)));
        assert_eq!(app.routes().len(), 1);
    }

    #[test]
    fn test_late_registration_rejected() {
        let mut app = Application::new();
        app.route("/ping", |_: &Context| Ping).unwrap();
        assert!(!app.is_frozen());

        let _ = app.handle(Environ::for_request("GET", "/ping"));
        assert!(app.is_frozen());

        let err = app.route("/late", |_: &Context| Ping).unwrap_err();
        assert_eq!(err, RegistrationError::late("/late"));
    }

    #[test]
    fn test_route_versioned() {
        let mut app = Application::new();
        app.route_versioned("/ping", &[1, 2], |_: &Context| Ping).unwrap();
        assert_eq!(app.patterns_for::<Ping>(), vec!["/v1/ping", "/v2/ping"]);
    }

    #[test]
    fn test_route_versioned_disabled() {
        let config = AppConfig {
            insert_version: false,
            ..AppConfig::default()
        };
        let mut app = Application::from_config(&config);
        app.route_versioned("/ping", &[1, 2], |_: &Context| Ping).unwrap();
        assert_eq!(app.patterns_for::<Ping>(), vec!["/ping"]);
    }

    #[test]
    fn test_patterns_for_filters_by_type() {
        let mut app = Application::new();
        app.route("/a", |_: &Context| Ping).unwrap();
        app.route("/b", |_: &Context| Other).unwrap();
        app.route("/c/{x}", |_: &Context| Ping).unwrap();
        assert_eq!(app.patterns_for::<Ping>(), vec!["/a", "/c/{x}"]);
        assert_eq!(app.patterns_for::<Other>(), vec!["/b"]);
    }

    #[test]
    fn test_bad_environ_is_400() {
        let mut app = Application::new();
        app.add_default_header("Server", "bamboo");
        let response = app.handle(Environ::new().with("PATH_INFO", "/ping"));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.header("server"), Some("bamboo"));
        assert_eq!(response.header("content-length"), Some("0"));
    }

    #[test]
    fn test_call_reports_status_line() {
        let mut app = Application::new();
        app.route("/ping", |_: &Context| Ping).unwrap();

        let mut seen = None;
        let body: Vec<_> = app
            .call(Environ::for_request("GET", "/ping"), |status, headers| {
                seen = Some((status.to_string(), headers.to_vec()));
            })
            .collect();

        let (status, headers) = seen.unwrap();
        assert_eq!(status, "200 OK");
        assert!(headers.contains(&("Content-Length".to_string(), "4".to_string())));
        assert_eq!(body, vec![bytes::Bytes::from_static(b"pong")]);
    }
}
