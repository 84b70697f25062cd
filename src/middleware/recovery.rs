use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::{self, AssertUnwindSafe};

use http::StatusCode;
use tracing::error;

use super::core::{Handler, Middleware};
use crate::dispatcher::Context;

/// Turns a panic anywhere downstream into a 500 response
///
/// Must come before the handlers it protects. The panic is logged with its
/// message and a backtrace; if nothing was written yet the response becomes
/// a JSON 500, then the chain is aborted.
pub struct Recovery;

/// Best effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl Middleware for Recovery {
    fn handle(&self, c: &mut Context) {
        let result = panic::catch_unwind(AssertUnwindSafe(|| c.next()));
        if let Err(payload) = result {
            let message = panic_message(payload.as_ref());
            let backtrace = Backtrace::capture();
            error!(
                method = %c.method(),
                path = %c.path(),
                route = %c.full_path(),
                panic_message = %message,
                backtrace = %backtrace,
                "Handler panicked, recovered"
            );
            if c.writer().written() {
                c.abort();
            } else {
                c.fail(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
            }
        }
    }
}

/// Panic recovery middleware
#[must_use]
pub fn recovery() -> Handler {
    Recovery.into_handler()
}
