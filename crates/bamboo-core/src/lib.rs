//! # Bamboo Core
//!
//! Core types and traits for the Bamboo endpoint framework.
//!
//! - [`Context`] - per-request state: request accessors and response mutators
//! - [`RequestInfo`] - immutable request metadata plus the body stream
//! - [`Endpoint`] / [`MethodTable`] - the endpoint contract
//! - [`HandlerError`] / [`ErrorResponse`] - failure and short-circuit signals
//! - [`RequestId`] - UUID v7 request identifier

#![doc(html_root_url = "https://docs.rs/bamboo-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod endpoint;
mod error;
mod request;
mod response;

pub use context::{BodyStream, Context, RequestId, ResponseBody, ResponseState};
pub use endpoint::{factory, Callback, Endpoint, EndpointFactory, MethodTable};
pub use error::{ContextError, HandlerError, HandlerResult, RegistrationError};
pub use request::{BodyReader, ContentType, HostAddr, RequestInfo};
pub use response::{ApiError, ErrorResponse, JSON_CONTENT_TYPE};

pub use bamboo_router::{ParamValue, ParameterBindings};
