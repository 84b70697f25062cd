use std::time::Instant;

use tracing::info;

use super::core::{Handler, Middleware};
use super::request_id::REQUEST_ID_KEY;
use crate::dispatcher::Context;
use crate::ids::RequestId;

/// Logs one line per request after the rest of the chain finished
pub struct Logger;

impl Middleware for Logger {
    fn handle(&self, c: &mut Context) {
        let start = Instant::now();
        c.next();
        let latency_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);

        let request_id = c
            .get_as::<RequestId>(REQUEST_ID_KEY)
            .map(|id| id.to_string())
            .unwrap_or_default();
        info!(
            status = c.writer().status().as_u16(),
            method = %c.method(),
            path = %c.path(),
            route = %c.full_path(),
            latency_us = latency_us,
            request_id = %request_id,
            "Request completed"
        );
    }
}

/// Request logging middleware
#[must_use]
pub fn logger() -> Handler {
    Logger.into_handler()
}
