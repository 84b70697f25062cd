//! Handler type and built-in middleware.
//!
//! Middleware is an ordinary [`Handler`]: it runs in chain order and may call
//! [`Context::next`](crate::dispatcher::Context::next) to wrap everything
//! after it.

mod auth;
mod core;
mod logger;
mod recovery;
mod request_id;

pub use auth::{basic_auth, BasicAuth, AUTH_USER_KEY};
pub use core::{handler, Handler, Middleware};
pub use logger::{logger, Logger};
pub use recovery::{recovery, Recovery};
pub use request_id::{request_id, RequestIdMiddleware, REQUEST_ID_KEY};

pub(crate) use recovery::panic_message;
