//! Gateway boundary errors.

use thiserror::Error;

/// An environment that cannot be turned into a request.
///
/// The application answers these with `400 Bad Request`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvironError {
    /// `REQUEST_METHOD` is absent.
    #[error("environ is missing REQUEST_METHOD")]
    MissingMethod,

    /// `REQUEST_METHOD` is not a valid HTTP method token.
    #[error("invalid request method: {0:?}")]
    InvalidMethod(String),
}
