//! Route registration errors.

use thiserror::Error;

/// Errors raised while registering a pattern in a [`RouteTable`](crate::RouteTable).
///
/// Resolution never fails with an error: a path that matches nothing simply
/// resolves to `None`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The pattern text could not be parsed.
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern text.
        pattern: String,
        /// Why the pattern was rejected.
        reason: String,
    },

    /// A structurally identical pattern is already registered.
    #[error("route pattern '{pattern}' duplicates already registered '{existing}'")]
    DuplicateRoute {
        /// The pattern being registered.
        pattern: String,
        /// The previously registered pattern it collides with.
        existing: String,
    },
}

impl RouteError {
    /// Creates an invalid pattern error.
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Creates a duplicate route error.
    pub fn duplicate(pattern: impl Into<String>, existing: impl Into<String>) -> Self {
        Self::DuplicateRoute {
            pattern: pattern.into(),
            existing: existing.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pattern_display() {
        let err = RouteError::invalid_pattern("/a/{x:uuid}", "unknown parameter kind 'uuid'");
        assert!(err.to_string().contains("/a/{x:uuid}"));
        assert!(err.to_string().contains("uuid"));
    }

    #[test]
    fn test_duplicate_display() {
        let err = RouteError::duplicate("/users/{name}", "/users/{id}");
        assert_eq!(
            err.to_string(),
            "route pattern '/users/{name}' duplicates already registered '/users/{id}'"
        );
    }
}
