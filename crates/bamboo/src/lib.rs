//! # Bamboo
//!
//! **Class-based HTTP endpoints over a WSGI-style synchronous gateway**
//!
//! - **Typed routes** – `/users/{id:int}`, `/files/{rest:path}`, literal segments win
//! - **Endpoint structs** – one fresh instance per request, one callback per method
//! - **Contained failures** – errors and panics become a 500, never a dropped request
//! - **Observability** – `tracing` spans and events, Prometheus request metrics
//!
//! ## Quick Start
//!
//! ```
//! use bamboo::prelude::*;
//!
//! struct Greeter {
//!     greeting: String,
//! }
//!
//! impl Greeter {
//!     fn get(&mut self, ctx: &mut Context) -> HandlerResult {
//!         let name = ctx.param_str("name").unwrap_or("world").to_string();
//!         ctx.add_header("Content-Type", "text/plain");
//!         ctx.send_body(format!("{}, {name}!", self.greeting))?;
//!         Ok(())
//!     }
//! }
//!
//! impl Endpoint for Greeter {
//!     fn methods() -> MethodTable<Self> {
//!         MethodTable::new().get(Self::get)
//!     }
//! }
//!
//! let mut app = Application::new();
//! let greeting = String::from("Hello");
//! app.route("/hello/{name}", move |_: &Context| Greeter {
//!     greeting: greeting.clone(),
//! })
//! .unwrap();
//!
//! let body: Vec<u8> = app
//!     .call(Environ::for_request("GET", "/hello/bamboo"), |status, _headers| {
//!         assert_eq!(status, "200 OK");
//!     })
//!     .flatten()
//!     .collect();
//! assert_eq!(body, b"Hello, bamboo!");
//! ```
//!
//! ## Request flow
//!
//! ```text
//! Environ → Application::handle → Dispatcher → RouteTable::resolve
//!                                      ↓
//!                       factory → before → callback → after
//!                                      ↓
//! (status, headers, body) ← Response ← finalise (default headers, Content-Length)
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod application;
mod dispatcher;
mod environ;
mod error;
mod response;

pub use application::Application;
pub use dispatcher::{Dispatcher, ErrorHook, FailureReport, Routes};
pub use environ::Environ;
pub use error::EnvironError;
pub use response::{Body, Response};

// Re-export the building blocks
pub use bamboo_config as config;
pub use bamboo_core as core;
pub use bamboo_router as router;
pub use bamboo_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use bamboo::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{Application, Environ, FailureReport, Response};

    pub use bamboo_core::{
        ApiError, Context, ContextError, Endpoint, ErrorResponse, HandlerError, HandlerResult,
        MethodTable, ParamValue, RegistrationError,
    };

    pub use http::{Method, StatusCode};
}
