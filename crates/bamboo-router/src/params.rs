//! Typed path parameter storage.
//!
//! This module provides storage for the parameters extracted by a successful
//! match, using a small-vector optimization to avoid heap allocations for
//! common cases (1-4 parameters).

use std::fmt;

use smallvec::SmallVec;

/// Maximum number of bindings stored inline (stack allocated).
const INLINE_PARAMS: usize = 4;

/// A converted path parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// A `string` parameter (one non-empty segment).
    Str(String),
    /// An `int` parameter.
    Int(i64),
    /// A `float` parameter.
    Float(f64),
    /// A `path` remainder, trailing segments joined with `/`.
    Path(String),
}

impl ParamValue {
    /// Returns the text of a `string` or `path` value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) | Self::Path(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value of an `int` parameter.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value of a `float` parameter, widening `int` values.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) | Self::Path(s) => f.write_str(s),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

/// Parameters bound by a successful route match.
///
/// Bindings keep the order in which the parameters appear in the pattern.
///
/// # Example
///
/// ```rust
/// use bamboo_router::{ParamValue, ParameterBindings};
///
/// let mut bindings = ParameterBindings::new();
/// bindings.push("userId", ParamValue::Int(123));
/// bindings.push("action", ParamValue::Str("view".to_string()));
///
/// assert_eq!(bindings.get_int("userId"), Some(123));
/// assert_eq!(bindings.get_str("action"), Some("view"));
/// assert_eq!(bindings.get("unknown"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterBindings {
    inner: SmallVec<[(String, ParamValue); INLINE_PARAMS]>,
}

impl ParameterBindings {
    /// Creates an empty set of bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set of bindings with the given capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: SmallVec::with_capacity(capacity),
        }
    }

    /// Adds a binding.
    pub fn push(&mut self, name: impl Into<String>, value: ParamValue) {
        self.inner.push((name.into(), value));
    }

    /// Returns the value bound to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Returns the text bound to a `string` or `path` parameter.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_str)
    }

    /// Returns the integer bound to an `int` parameter.
    #[must_use]
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ParamValue::as_int)
    }

    /// Returns the number bound to a `float` (or `int`) parameter.
    #[must_use]
    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ParamValue::as_float)
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns an iterator over `(name, value)` pairs in pattern order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl<'a> IntoIterator for &'a ParameterBindings {
    type Item = (&'a str, &'a ParamValue);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (String, ParamValue)>,
        fn(&'a (String, ParamValue)) -> (&'a str, &'a ParamValue),
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl FromIterator<(String, ParamValue)> for ParameterBindings {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bindings_new() {
        let bindings = ParameterBindings::new();
        assert!(bindings.is_empty());
        assert_eq!(bindings.len(), 0);
    }

    #[test]
    fn test_typed_accessors() {
        let mut bindings = ParameterBindings::new();
        bindings.push("id", ParamValue::Int(7));
        bindings.push("ratio", ParamValue::Float(0.5));
        bindings.push("rest", ParamValue::Path("a/b".to_string()));

        assert_eq!(bindings.get_int("id"), Some(7));
        assert_eq!(bindings.get_float("id"), Some(7.0));
        assert_eq!(bindings.get_float("ratio"), Some(0.5));
        assert_eq!(bindings.get_str("rest"), Some("a/b"));
        assert_eq!(bindings.get_str("id"), None);
        assert_eq!(bindings.get_int("rest"), None);
    }

    #[test]
    fn test_iter_preserves_order() {
        let mut bindings = ParameterBindings::new();
        bindings.push("a", ParamValue::Int(1));
        bindings.push("b", ParamValue::Str("x".to_string()));

        let names: Vec<_> = bindings.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_display() {
        assert_eq!(ParamValue::Int(-3).to_string(), "-3");
        assert_eq!(ParamValue::Float(1.5).to_string(), "1.5");
        assert_eq!(ParamValue::Path("x/y".to_string()).to_string(), "x/y");
    }

    #[test]
    fn test_many_bindings() {
        let bindings: ParameterBindings = (0..10)
            .map(|i| (format!("key{i}"), ParamValue::Int(i)))
            .collect();

        assert_eq!(bindings.len(), 10);
        assert_eq!(bindings.get_int("key5"), Some(5));
    }
}
