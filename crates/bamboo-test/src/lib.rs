//! # Bamboo Test
//!
//! Test utilities for Bamboo applications. Requests are turned into a
//! gateway [`Environ`](bamboo::Environ) and passed through
//! [`Application::call`](bamboo::Application::call), so they take the same
//! path as a request from a real server: routing, endpoint construction,
//! hooks, error containment and response finalisation.
//!
//! ## Example
//!
//! ```
//! use bamboo::prelude::*;
//! use bamboo_test::TestClient;
//! use serde_json::json;
//!
//! struct Users;
//!
//! impl Users {
//!     fn post(&mut self, ctx: &mut Context) -> HandlerResult {
//!         let body = ctx.read_body()?;
//!         ctx.set_status(StatusCode::CREATED);
//!         ctx.add_header("Content-Type", "application/json");
//!         ctx.send_body(body)?;
//!         Ok(())
//!     }
//! }
//!
//! impl Endpoint for Users {
//!     fn methods() -> MethodTable<Self> {
//!         MethodTable::new().post(Self::post)
//!     }
//! }
//!
//! let mut app = Application::new();
//! app.route("/users", |_: &Context| Users).unwrap();
//!
//! let client = TestClient::new(app);
//! client
//!     .post("/users")
//!     .json(&json!({ "name": "Alice" }))
//!     .send()
//!     .assert_status(StatusCode::CREATED)
//!     .assert_json_field("name", &json!("Alice"));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
