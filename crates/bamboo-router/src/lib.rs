//! Typed path-pattern route table for Bamboo.
//!
//! This crate stores registered path patterns and resolves incoming request
//! paths to the value registered for the best matching pattern, extracting
//! typed path parameters along the way.
//!
//! # Features
//!
//! - **Typed Parameters**: `{id:int}`, `{ratio:float}`, `{name}` / `{name:string}`
//! - **Remainder Capture**: `{rest:path}` absorbs every trailing segment
//! - **Deterministic Ranking**: literal segments beat parameters, parameters beat
//!   remainders, ties go to the first registered pattern
//! - **Bucketed Lookup**: patterns are indexed by their first literal segment
//!
//! # Example
//!
//! ```rust
//! use bamboo_router::{ParamValue, RouteTable};
//!
//! let mut table = RouteTable::new();
//! table.register("/users/new", "newUser").unwrap();
//! table.register("/users/{id:int}", "getUser").unwrap();
//! table.register("/files/{rest:path}", "serveFile").unwrap();
//!
//! let resolved = table.resolve("/users/42").unwrap();
//! assert_eq!(*resolved.value, "getUser");
//! assert_eq!(resolved.bindings.get("id"), Some(&ParamValue::Int(42)));
//!
//! let resolved = table.resolve("/users/new").unwrap();
//! assert_eq!(*resolved.value, "newUser");
//!
//! let resolved = table.resolve("/files/a/b/c").unwrap();
//! assert_eq!(resolved.bindings.get_str("rest"), Some("a/b/c"));
//!
//! assert!(table.resolve("/users/abc").is_none());
//! ```
//!
//! # Pattern Syntax
//!
//! ```text
//! /orgs/{org}/users/{id:int}/files/{rest:path}
//!  ^^^^  ^^^^^        ^^^^^^^^       ^^^^^^^^^^^
//!  literal string     int param      remainder (last segment only)
//! ```

mod error;
mod params;
mod path;
mod pattern;
mod table;

pub use error::RouteError;
pub use params::{ParamValue, ParameterBindings};
pub use path::split_path;
pub use pattern::{ParamKind, PatternSegment, RoutePattern};
pub use table::{Resolved, RouteTable};
