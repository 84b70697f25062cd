use base64::{engine::general_purpose, Engine as _};
use http::header::{HeaderValue, WWW_AUTHENTICATE};
use http::StatusCode;
use tracing::warn;

use super::core::{Handler, Middleware};
use crate::dispatcher::Context;

/// Annotation key holding the authenticated user name
pub const AUTH_USER_KEY: &str = "user";

/// HTTP Basic authentication for a single credential pair
pub struct BasicAuth {
    user: String,
    expected: String,
    challenge: HeaderValue,
}

impl BasicAuth {
    #[must_use]
    pub fn new(user: &str, password: &str) -> Self {
        let token = general_purpose::STANDARD.encode(format!("{user}:{password}"));
        Self {
            user: user.to_string(),
            expected: format!("Basic {token}"),
            challenge: HeaderValue::from_static("Basic realm=\"Authorization Required\""),
        }
    }

    fn matches(&self, presented: &str) -> bool {
        let (a, b) = (presented.as_bytes(), self.expected.as_bytes());
        // compare every byte regardless of where the first mismatch is
        a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}

impl Middleware for BasicAuth {
    fn handle(&self, c: &mut Context) {
        let authorized = c.header("authorization").is_some_and(|h| self.matches(h));
        if authorized {
            c.set(AUTH_USER_KEY, self.user.clone());
            return;
        }
        warn!(method = %c.method(), path = %c.path(), "Basic auth rejected");
        c.set_header(WWW_AUTHENTICATE, self.challenge.clone());
        c.abort_with_status(StatusCode::UNAUTHORIZED);
    }
}

/// Basic auth middleware accepting exactly `user:password`
#[must_use]
pub fn basic_auth(user: &str, password: &str) -> Handler {
    BasicAuth::new(user, password).into_handler()
}
