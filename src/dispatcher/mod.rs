//! # Dispatcher Module
//!
//! Registration, chain composition and per-request execution.
//!
//! ## Overview
//!
//! - [`Engine`] collects routes and scoped middleware during setup
//! - [`Engine::build`] freezes everything into a [`Dispatcher`]
//! - [`Dispatcher::serve`] resolves a request, builds its chain, runs it in a
//!   pooled [`Context`] and returns the buffered response
//!
//! ## Chain composition
//!
//! For a matched route the chain is the middleware of every scope whose
//! prefix is a string prefix of the request path (in scope creation order),
//! followed by the route's own handlers. An unmatched request runs only the
//! not-found chain.
//!
//! ```rust
//! use chainrouter::dispatcher::Engine;
//! use chainrouter::middleware::{handler, request_id};
//! use http::StatusCode;
//!
//! let mut engine = Engine::default_stack();
//! let mut root = engine.root();
//! let mut api = root.group("/api");
//! api.use_middleware([request_id()]);
//! api.get("/ping", [handler(|c| c.string(StatusCode::OK, "pong"))])
//!     .unwrap();
//! let dispatcher = engine.build();
//! # let _ = dispatcher;
//! ```
//!
//! ## Panics
//!
//! Without [`recovery`](crate::middleware::recovery) in the chain, a handler
//! panic unwinds out of [`Dispatcher::serve`]. The HTTP server converts such
//! a panic into a 500 at its own boundary.

mod context;
mod core;
mod pool;
mod scope;

pub use context::{Context, Keys, Value};
pub use core::{Dispatcher, Engine, ScopeRef, ANY_METHODS};
pub use pool::{ContextPool, PoolMetrics, DEFAULT_POOL_CAPACITY};
pub use scope::{Scope, ScopeId};
