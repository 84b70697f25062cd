use http::header::{HeaderName, HeaderValue};

use super::core::{Handler, Middleware};
use crate::dispatcher::Context;
use crate::ids::{RequestId, REQUEST_ID_HEADER};

/// Annotation key holding the request's [`RequestId`]
pub const REQUEST_ID_KEY: &str = "request_id";

/// Tags each request with a ULID
///
/// A valid incoming `x-request-id` is kept so ids correlate across services;
/// anything else is replaced with a fresh id.
pub struct RequestIdMiddleware;

impl Middleware for RequestIdMiddleware {
    fn handle(&self, c: &mut Context) {
        let id = RequestId::from_header_or_new(c.header(REQUEST_ID_HEADER));
        c.set(REQUEST_ID_KEY, id);
        if let Ok(value) = HeaderValue::try_from(id.to_string()) {
            c.set_header(HeaderName::from_static(REQUEST_ID_HEADER), value);
        }
    }
}

#[must_use]
pub fn request_id() -> Handler {
    RequestIdMiddleware.into_handler()
}
