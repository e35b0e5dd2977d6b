//! Route pattern parsing and matching.
//!
//! A pattern is a `/`-separated list of segments. Each segment is either a
//! literal or a parameter placeholder written `{name}` or `{name:kind}`.

use std::fmt;

use crate::error::RouteError;
use crate::params::{ParamValue, ParameterBindings};
use crate::path::raw_segments;

/// Conversion applied to the path text bound by a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Any non-empty segment (`{name}` or `{name:string}`).
    String,
    /// A base-10 signed integer (`{name:int}`).
    Int,
    /// A finite base-10 floating point number (`{name:float}`).
    Float,
    /// One or more trailing segments (`{name:path}`), last segment only.
    Remainder,
}

impl ParamKind {
    /// Looks up a kind by the name used in pattern syntax.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" | "str" => Some(Self::String),
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "path" => Some(Self::Remainder),
            _ => None,
        }
    }

    /// The name used in pattern syntax.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Remainder => "path",
        }
    }

    /// Converts a single decoded segment.
    ///
    /// Malformed text is a non-match (`None`), never an error.
    #[must_use]
    pub fn convert(self, segment: &str) -> Option<ParamValue> {
        if segment.is_empty() {
            return None;
        }
        match self {
            Self::String => Some(ParamValue::Str(segment.to_string())),
            Self::Int => segment.parse::<i64>().ok().map(ParamValue::Int),
            Self::Float => segment
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(ParamValue::Float),
            Self::Remainder => Some(ParamValue::Path(segment.to_string())),
        }
    }
}

/// One segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment {
    /// Must equal the request segment exactly.
    Literal(String),
    /// Binds the request segment under `name` after conversion.
    Param {
        /// Binding name.
        name: String,
        /// Conversion applied to the segment.
        kind: ParamKind,
    },
}

impl PatternSegment {
    /// Ranking weight used to order overlapping matches.
    const fn weight(&self) -> u8 {
        match self {
            Self::Literal(_) => 2,
            Self::Param {
                kind: ParamKind::Remainder,
                ..
            } => 0,
            Self::Param { .. } => 1,
        }
    }

    /// Same literal text, or a parameter of the same kind (names ignored).
    fn same_shape(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(a), Self::Literal(b)) => a == b,
            (Self::Param { kind: a, .. }, Self::Param { kind: b, .. }) => a == b,
            _ => false,
        }
    }

    fn parse(pattern: &str, raw: &str) -> Result<Self, RouteError> {
        let Some(inner) = raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) else {
            if raw.contains(['{', '}']) {
                return Err(RouteError::invalid_pattern(
                    pattern,
                    format!("unbalanced braces in segment '{raw}'"),
                ));
            }
            return Ok(Self::Literal(raw.to_string()));
        };

        let (name, kind) = match inner.split_once(':') {
            Some((name, kind_name)) => {
                let kind = ParamKind::from_name(kind_name).ok_or_else(|| {
                    RouteError::invalid_pattern(
                        pattern,
                        format!("unknown parameter kind '{kind_name}'"),
                    )
                })?;
                (name, kind)
            }
            None => (inner, ParamKind::String),
        };

        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(RouteError::invalid_pattern(
                pattern,
                format!("invalid parameter name '{name}'"),
            ));
        }

        Ok(Self::Param {
            name: name.to_string(),
            kind,
        })
    }
}

impl fmt::Display for PatternSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.write_str(text),
            Self::Param {
                name,
                kind: ParamKind::String,
            } => write!(f, "{{{name}}}"),
            Self::Param { name, kind } => write!(f, "{{{name}:{}}}", kind.name()),
        }
    }
}

/// A parsed, immutable route pattern.
///
/// # Example
///
/// ```rust
/// use bamboo_router::{ParamKind, PatternSegment, RoutePattern};
///
/// let pattern = RoutePattern::parse("/users/{id:int}").unwrap();
/// assert_eq!(pattern.segments().len(), 2);
/// assert_eq!(
///     pattern.segments()[1],
///     PatternSegment::Param { name: "id".to_string(), kind: ParamKind::Int }
/// );
///
/// assert!(RoutePattern::parse("/files/{rest:path}/meta").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    text: String,
    segments: Vec<PatternSegment>,
    weights: Vec<u8>,
}

impl RoutePattern {
    /// Parses pattern text.
    ///
    /// Leading and trailing separators are optional; `/` and the empty string
    /// both denote the root pattern.
    pub fn parse(text: &str) -> Result<Self, RouteError> {
        let segments = raw_segments(text)
            .map(|raw| PatternSegment::parse(text, raw))
            .collect::<Result<Vec<_>, _>>()?;

        let last = segments.len() - 1;
        let mut names: Vec<&str> = Vec::new();
        for (i, segment) in segments.iter().enumerate() {
            if let PatternSegment::Param { name, kind } = segment {
                if *kind == ParamKind::Remainder && i != last {
                    return Err(RouteError::invalid_pattern(
                        text,
                        format!("remainder parameter '{name}' must be the last segment"),
                    ));
                }
                if names.contains(&name.as_str()) {
                    return Err(RouteError::invalid_pattern(
                        text,
                        format!("parameter '{name}' is bound twice"),
                    ));
                }
                names.push(name);
            }
        }

        let weights = segments.iter().map(PatternSegment::weight).collect();
        Ok(Self {
            text: text.to_string(),
            segments,
            weights,
        })
    }

    /// The pattern text as registered.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The parsed segments.
    #[must_use]
    pub fn segments(&self) -> &[PatternSegment] {
        &self.segments
    }

    /// Returns true if the final segment is a remainder parameter.
    #[must_use]
    pub fn has_remainder(&self) -> bool {
        matches!(
            self.segments.last(),
            Some(PatternSegment::Param {
                kind: ParamKind::Remainder,
                ..
            })
        )
    }

    /// The literal text of the first segment, if it is a literal.
    #[must_use]
    pub fn first_literal(&self) -> Option<&str> {
        match self.segments.first() {
            Some(PatternSegment::Literal(text)) => Some(text),
            _ => None,
        }
    }

    /// Per-position ranking weights, compared lexicographically.
    pub(crate) fn weights(&self) -> &[u8] {
        &self.weights
    }

    /// Returns true if both patterns would accept exactly the same paths.
    #[must_use]
    pub fn is_duplicate_of(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| a.same_shape(b))
    }

    /// Matches decoded request segments, returning the bindings on success.
    #[must_use]
    pub fn match_segments(&self, segments: &[String]) -> Option<ParameterBindings> {
        let arity_ok = if self.has_remainder() {
            segments.len() >= self.segments.len()
        } else {
            segments.len() == self.segments.len()
        };
        if !arity_ok {
            return None;
        }

        let mut bindings = ParameterBindings::new();
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PatternSegment::Literal(text) => {
                    if *text != segments[i] {
                        return None;
                    }
                }
                PatternSegment::Param {
                    name,
                    kind: ParamKind::Remainder,
                } => {
                    let rest = segments[i..].join("/");
                    bindings.push(name.clone(), ParamKind::Remainder.convert(&rest)?);
                }
                PatternSegment::Param { name, kind } => {
                    bindings.push(name.clone(), kind.convert(&segments[i])?);
                }
            }
        }
        Some(bindings)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
