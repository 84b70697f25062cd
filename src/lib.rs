//! # chainrouter
//!
//! An embeddable HTTP request dispatcher: per-method segment tries with
//! deterministic precedence, prefix-scoped middleware and cooperative
//! handler chains with abort and panic recovery.
//!
//! ## Overview
//!
//! - **[`router`]** - pattern parsing, per-method tries, conflict detection
//! - **[`dispatcher`]** - `Engine` registration, frozen `Dispatcher`, request `Context`
//! - **[`middleware`]** - the `Handler` type plus logger, recovery, request id and basic auth
//! - **[`render`]** - text, JSON, raw data and redirect renderers
//! - **[`server`]** - hyper based HTTP/1.1 transport and the response writer
//! - **[`runtime_config`]** / **[`logging`]** - environment and file driven setup
//!
//! ## Request flow
//!
//! ```text
//! request ──► RouteTable::resolve(method, path)
//!               │ miss ──► [not-found chain]
//!               ▼ hit
//!             scope middleware (every matching prefix, creation order)
//!               + route handlers
//!               ▼
//!             pooled Context ──► next() ──► … ──► ResponseWriter ──► response
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chainrouter::dispatcher::Engine;
//! use chainrouter::middleware::handler;
//! use chainrouter::server::HttpServer;
//! use http::StatusCode;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let mut engine = Engine::default_stack();
//! engine.root().get("/hello/:name", [handler(|c| {
//!     let text = format!("hello {}", c.param("name"));
//!     c.string(StatusCode::OK, text);
//! })])?;
//!
//! let dispatcher = Arc::new(engine.build());
//! HttpServer::new(dispatcher).run_until_signal("127.0.0.1:8080").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Route patterns
//!
//! | Pattern | Request | Params |
//! |---|---|---|
//! | `/hello/:name` | `/hello/knight` | `name = "knight"` |
//! | `/static/*filepath` | `/static/css/a.css` | `filepath = "css/a.css"` |
//!
//! A literal and a param/wildcard route ending at the same position are
//! rejected at registration with [`router::RouteError::Conflict`].

pub mod cli;
pub mod dispatcher;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod render;
pub mod router;
pub mod runtime_config;
pub mod server;

pub use dispatcher::{Context, Dispatcher, Engine, ScopeId};
pub use middleware::{handler, Handler};
pub use router::RouteError;
