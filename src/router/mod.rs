//! # Router Module
//!
//! Path matching and route resolution.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Splitting patterns and request paths into segments ([`parse_pattern`])
//! - Storing routes in one segment trie per HTTP method ([`RouteTrie`])
//! - Rejecting ambiguous registrations up front ([`RouteError::Conflict`])
//! - Matching requests and binding `:param` / `*wildcard` values ([`RouteTable::resolve`])
//!
//! ## Pattern syntax
//!
//! | Segment | Matches | Binds |
//! |---|---|---|
//! | `users` | exactly `users` | nothing |
//! | `:id` | any one segment | that segment |
//! | `*path` | the rest of the path | remaining segments joined by `/` |
//!
//! ## Example
//!
//! ```rust
//! use chainrouter::router::RouteTable;
//! use http::Method;
//!
//! let mut table = RouteTable::new();
//! table.register("GET", "/hello/:name", "hello").unwrap();
//! table.register("GET", "/static/*filepath", "static").unwrap();
//!
//! let m = table.resolve(&Method::GET, "/static/css/a.css").unwrap();
//! assert_eq!(*m.value, "static");
//! assert_eq!(m.params.get("filepath"), Some("css/a.css"));
//! ```
//!
//! The table is generic over the stored value; the dispatcher stores handler
//! chains in it.

mod core;
mod error;
mod pattern;
mod radix;

pub use core::{ParamVec, Params, RouteMatch, RouteTable, MAX_INLINE_PARAMS};
pub use error::RouteError;
pub use pattern::{parse_pattern, SegmentKind, Segments};
pub use radix::{RouteEntry, RouteTrie};
