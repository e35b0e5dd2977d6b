//! Error types for Bamboo.
//!
//! Three families of errors live here:
//!
//! - [`RegistrationError`] - raised synchronously while routes are registered
//! - [`ContextError`] - misuse of the per-request [`Context`](crate::Context)
//! - [`HandlerError`] - anything an endpoint callback or hook returns
//!
//! `HandlerError` is what endpoint code propagates with `?`. It separates the
//! explicit "respond with this status" signal ([`HandlerError::Respond`]) from
//! genuine failures, which the dispatcher turns into a 500 response.

use std::fmt;

use bamboo_router::RouteError;
use thiserror::Error;

use crate::response::ErrorResponse;

/// Result type returned by endpoint callbacks and hooks.
pub type HandlerResult = Result<(), HandlerError>;

/// Errors raised while registering routes on an application.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The pattern was invalid or duplicates an existing one.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// The application already started dispatching requests.
    #[error("cannot register '{pattern}': application is already serving requests")]
    LateRegistration {
        /// The pattern that was rejected.
        pattern: String,
    },
}

impl RegistrationError {
    /// Creates a late registration error.
    pub fn late(pattern: impl Into<String>) -> Self {
        Self::LateRegistration {
            pattern: pattern.into(),
        }
    }
}

/// Misuse of the per-request context.
#[derive(Error, Debug)]
pub enum ContextError {
    /// The request body was already consumed.
    #[error("request body has already been read")]
    BodyAlreadyRead,

    /// A response body was already set.
    #[error("response body has already been set")]
    ResponseAlreadyFinalized,

    /// Reading the request body failed.
    #[error("failed to read request body: {0}")]
    BodyRead(#[source] std::io::Error),

    /// A response value could not be serialized.
    #[error("failed to serialize response body: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// The error type returned by endpoint callbacks and hooks.
///
/// # Example
///
/// ```
/// use bamboo_core::{Context, ErrorResponse, HandlerResult};
/// use http::StatusCode;
///
/// fn get(ctx: &mut Context) -> HandlerResult {
///     let Some(id) = ctx.param_int("id") else {
///         return Err(ErrorResponse::new(StatusCode::BAD_REQUEST).into());
///     };
///     ctx.send_body(format!("item {id}"))?;
///     Ok(())
/// }
/// ```
pub enum HandlerError {
    /// Short-circuit with the given response. Not treated as a failure.
    Respond(ErrorResponse),
    /// The context was misused.
    Context(ContextError),
    /// Any other failure.
    Failed(anyhow::Error),
}

impl HandlerError {
    /// Wraps an arbitrary error as a failure.
    pub fn failed(error: impl Into<anyhow::Error>) -> Self {
        Self::Failed(error.into())
    }

    /// Returns true for the explicit response signal.
    pub const fn is_signal(&self) -> bool {
        matches!(self, Self::Respond(_))
    }

    /// Converts a failure into an `anyhow::Error`.
    ///
    /// The explicit response signal is handed back as `Err`.
    pub fn into_failure(self) -> Result<anyhow::Error, ErrorResponse> {
        match self {
            Self::Respond(response) => Err(response),
            Self::Context(err) => Ok(anyhow::Error::new(err)),
            Self::Failed(err) => Ok(err),
        }
    }
}

impl fmt::Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Respond(response) => f.debug_tuple("Respond").field(response).finish(),
            Self::Context(err) => f.debug_tuple("Context").field(err).finish(),
            Self::Failed(err) => f.debug_tuple("Failed").field(err).finish(),
        }
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Respond(response) => write!(f, "respond with {}", response.status()),
            Self::Context(err) => fmt::Display::fmt(err, f),
            Self::Failed(err) => write!(f, "{err:#}"),
        }
    }
}

impl From<ErrorResponse> for HandlerError {
    fn from(response: ErrorResponse) -> Self {
        Self::Respond(response)
    }
}

impl From<ContextError> for HandlerError {
    fn from(err: ContextError) -> Self {
        Self::Context(err)
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(err: anyhow::Error) -> Self {
        Self::Failed(err)
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(err: std::io::Error) -> Self {
        Self::Failed(err.into())
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Failed(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_registration_error_display() {
        let err = RegistrationError::late("/users");
        assert_eq!(
            err.to_string(),
            "cannot register '/users': application is already serving requests"
        );

        let err: RegistrationError = RouteError::duplicate("/a/{y}", "/a/{x}").into();
        assert!(err.to_string().contains("duplicates"));
    }

    #[test]
    fn test_context_error_display() {
        assert_eq!(
            ContextError::BodyAlreadyRead.to_string(),
            "request body has already been read"
        );
        assert_eq!(
            ContextError::ResponseAlreadyFinalized.to_string(),
            "response body has already been set"
        );
    }

    #[test]
    fn test_signal_is_not_failure() {
        let err: HandlerError = ErrorResponse::new(StatusCode::FORBIDDEN).into();
        assert!(err.is_signal());
        let response = err.into_failure().unwrap_err();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_context_error_becomes_failure() {
        let err: HandlerError = ContextError::BodyAlreadyRead.into();
        assert!(!err.is_signal());
        let failure = err.into_failure().unwrap();
        assert!(failure.downcast_ref::<ContextError>().is_some());
    }

    #[test]
    fn test_question_mark_conversions() {
        fn io_failure() -> Result<(), HandlerError> {
            Err(std::io::Error::other("disk on fire"))?;
            Ok(())
        }
        fn anyhow_failure() -> Result<(), HandlerError> {
            Err(anyhow::anyhow!("boom"))?;
            Ok(())
        }

        assert_eq!(io_failure().unwrap_err().to_string(), "disk on fire");
        assert_eq!(anyhow_failure().unwrap_err().to_string(), "boom");
    }
}
