//! Route table registration and resolution.

use std::collections::HashMap;

use crate::error::RouteError;
use crate::params::ParameterBindings;
use crate::path::split_path;
use crate::pattern::RoutePattern;

struct Route<T> {
    pattern: RoutePattern,
    value: T,
}

/// The result of a successful resolution.
#[derive(Debug)]
pub struct Resolved<'a, T> {
    /// The winning pattern.
    pub pattern: &'a RoutePattern,
    /// The value registered for the winning pattern.
    pub value: &'a T,
    /// Converted parameter values, in pattern order.
    pub bindings: ParameterBindings,
}

/// An ordered table of route patterns.
///
/// Patterns are indexed by their first literal segment so a lookup only
/// examines patterns that can plausibly match, plus those whose first segment
/// is a parameter.
///
/// When several patterns match, the one whose segments are most specific wins:
/// positions are compared left to right, a literal beats a parameter and a
/// parameter beats a remainder. If two matches rank equally the earlier
/// registration wins.
pub struct RouteTable<T> {
    routes: Vec<Route<T>>,
    by_first_literal: HashMap<String, Vec<usize>>,
    dynamic_first: Vec<usize>,
}

impl<T> Default for RouteTable<T> {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            by_first_literal: HashMap::new(),
            dynamic_first: Vec::new(),
        }
    }
}

impl<T> RouteTable<T> {
    /// Creates an empty route table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `value` under `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPattern`] if the pattern does not parse and
    /// [`RouteError::DuplicateRoute`] if a pattern accepting exactly the same
    /// paths is already registered.
    pub fn register(&mut self, pattern: &str, value: T) -> Result<(), RouteError> {
        let parsed = RoutePattern::parse(pattern)?;

        if let Some(existing) = self
            .candidates(parsed.first_literal())
            .map(|i| &self.routes[i].pattern)
            .find(|p| p.is_duplicate_of(&parsed))
        {
            return Err(RouteError::duplicate(pattern, existing.as_str()));
        }

        let index = self.routes.len();
        match parsed.first_literal() {
            Some(first) => self
                .by_first_literal
                .entry(first.to_string())
                .or_default()
                .push(index),
            None => self.dynamic_first.push(index),
        }
        self.routes.push(Route {
            pattern: parsed,
            value,
        });
        Ok(())
    }

    /// Resolves a raw request path.
    ///
    /// Returns `None` if no pattern matches, including when a segment does
    /// not percent-decode to valid UTF-8.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<Resolved<'_, T>> {
        let segments = split_path(path)?;
        self.resolve_segments(&segments)
    }

    /// Resolves already-decoded path segments.
    #[must_use]
    pub fn resolve_segments(&self, segments: &[String]) -> Option<Resolved<'_, T>> {
        let first = segments.first().map(String::as_str);
        let mut best: Option<(usize, ParameterBindings)> = None;

        for index in self.candidates(first) {
            let route = &self.routes[index];
            let Some(bindings) = route.pattern.match_segments(segments) else {
                continue;
            };
            let better = match &best {
                None => true,
                Some((current, _)) => {
                    let current_weights = self.routes[*current].pattern.weights();
                    match route.pattern.weights().cmp(current_weights) {
                        std::cmp::Ordering::Greater => true,
                        std::cmp::Ordering::Equal => index < *current,
                        std::cmp::Ordering::Less => false,
                    }
                }
            };
            if better {
                best = Some((index, bindings));
            }
        }

        best.map(|(index, bindings)| {
            let route = &self.routes[index];
            Resolved {
                pattern: &route.pattern,
                value: &route.value,
                bindings,
            }
        })
    }

    /// Registered patterns, in registration order.
    pub fn patterns(&self) -> impl Iterator<Item = &RoutePattern> {
        self.routes.iter().map(|r| &r.pattern)
    }

    /// Registered `(pattern, value)` pairs, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&RoutePattern, &T)> {
        self.routes.iter().map(|r| (&r.pattern, &r.value))
    }

    /// Returns the number of registered patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no patterns are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn candidates<'s>(&'s self, first: Option<&str>) -> impl Iterator<Item = usize> + 's {
        let literal = first
            .and_then(|f| self.by_first_literal.get(f))
            .map(Vec::as_slice)
            .unwrap_or_default();
        literal.iter().chain(&self.dynamic_first).copied()
    }
}

impl<T> std::fmt::Debug for RouteTable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable")
            .field(
                "patterns",
                &self.patterns().map(RoutePattern::as_str).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParamValue;

    #[test]
    fn test_empty_table() {
        let table: RouteTable<()> = RouteTable::new();
        assert!(table.is_empty());
        assert!(table.resolve("/").is_none());
    }

    #[test]
    fn test_root_route() {
        let mut table = RouteTable::new();
        table.register("/", "root").unwrap();

        assert_eq!(*table.resolve("/").unwrap().value, "root");
        assert_eq!(*table.resolve("").unwrap().value, "root");
        assert!(table.resolve("/x").is_none());
    }

    #[test]
    fn test_literal_beats_param() {
        let mut table = RouteTable::new();
        table.register("/users/{id}", "param").unwrap();
        table.register("/users/me", "literal").unwrap();

        assert_eq!(*table.resolve("/users/me").unwrap().value, "literal");
        assert_eq!(*table.resolve("/users/you").unwrap().value, "param");
    }

    #[test]
    fn test_param_beats_remainder() {
        let mut table = RouteTable::new();
        table.register("/files/{rest:path}", "rest").unwrap();
        table.register("/files/{name}", "single").unwrap();

        assert_eq!(*table.resolve("/files/a").unwrap().value, "single");
        assert_eq!(*table.resolve("/files/a/b").unwrap().value, "rest");
    }

    #[test]
    fn test_leftmost_position_decides() {
        let mut table = RouteTable::new();
        table.register("/{a}/x", "param-first").unwrap();
        table.register("/p/{b}", "literal-first").unwrap();

        assert_eq!(*table.resolve("/p/x").unwrap().value, "literal-first");
    }

    #[test]
    fn test_equal_rank_first_registered_wins() {
        let mut table = RouteTable::new();
        table.register("/v/{id:int}", "int").unwrap();
        table.register("/v/{name}", "string").unwrap();

        assert_eq!(*table.resolve("/v/5").unwrap().value, "int");
        assert_eq!(*table.resolve("/v/five").unwrap().value, "string");
    }

    #[test]
    fn test_int_rejection_falls_through() {
        let mut table = RouteTable::new();
        table.register("/items/{id:int}", "item").unwrap();

        assert!(table.resolve("/items/abc").is_none());
        assert!(table.resolve("/items/").is_none());
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut table = RouteTable::new();
        table.register("/users/{id}", 1).unwrap();

        let err = table.register("/users/{name}", 2).unwrap_err();
        assert_eq!(err, RouteError::duplicate("/users/{name}", "/users/{id}"));
        assert_eq!(table.len(), 1);

        table.register("/users/{id:int}", 3).unwrap();
        table.register("{a}/{b}", 4).unwrap();
        assert!(table.register("/{x}/{y}/", 5).is_err());
    }

    #[test]
    fn test_invalid_pattern_not_registered() {
        let mut table = RouteTable::new();
        assert!(table.register("/a/{b:what}", ()).is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn test_percent_decoding() {
        let mut table = RouteTable::new();
        table.register("/hello world/{who}", ()).unwrap();

        let m = table.resolve("/hello%20world/J%C3%BCrgen").unwrap();
        assert_eq!(m.bindings.get_str("who"), Some("Jürgen"));
        assert!(table.resolve("/hello%20world/%FF").is_none());
    }

    #[test]
    fn test_trailing_slash_equivalent() {
        let mut table = RouteTable::new();
        table.register("/users", "list").unwrap();

        assert_eq!(*table.resolve("/users/").unwrap().value, "list");
        assert_eq!(*table.resolve("users").unwrap().value, "list");
    }

    #[test]
    fn test_resolved_reports_pattern() {
        let mut table = RouteTable::new();
        table.register("/a/{x:float}", ()).unwrap();

        let m = table.resolve("/a/2.5").unwrap();
        assert_eq!(m.pattern.as_str(), "/a/{x:float}");
        assert_eq!(m.bindings.get("x"), Some(&ParamValue::Float(2.5)));
    }

    #[test]
    fn test_patterns_in_registration_order() {
        let mut table = RouteTable::new();
        table.register("/b", ()).unwrap();
        table.register("/{a}", ()).unwrap();
        table.register("/c", ()).unwrap();

        let patterns: Vec<_> = table.patterns().map(RoutePattern::as_str).collect();
        assert_eq!(patterns, vec!["/b", "/{a}", "/c"]);
    }
}
