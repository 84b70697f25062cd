//! Request-scoped execution state.
//!
//! A [`Context`] carries one request through its handler chain. It owns the
//! chain, the cursor into it, the bound path params, the response writer and
//! the annotation map ([`Keys`]).
//!
//! ## Chain execution
//!
//! The cursor starts at `-1`. [`Context::next`] advances it and keeps
//! invoking handlers until the chain is exhausted. A handler that calls
//! `next()` itself drives the remaining chain from inside its own frame, so
//! code it runs afterwards observes every downstream handler as finished.
//! The outer loop then finds the cursor already at the end and returns.
//!
//! [`Context::abort`] moves the cursor to the end of the chain; whatever loop
//! is currently running stops after the active handler returns.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{Method, Request, StatusCode};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::error;

use crate::middleware::Handler;
use crate::render::{
    body_allowed_for_status, Data, Json, Redirect, Render, Text, JSON_CONTENT_TYPE,
};
use crate::router::Params;
use crate::server::ResponseWriter;

/// Value stored in the annotation map
pub type Value = Arc<dyn Any + Send + Sync>;

/// Lock-guarded request annotations
///
/// Shared through `Arc` so that background work spawned by a handler can
/// keep reading values after the handler returned.
#[derive(Default)]
pub struct Keys {
    map: RwLock<HashMap<String, Value>>,
}

impl fmt::Debug for Keys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map = self.map.read();
        f.debug_set().entries(map.keys()).finish()
    }
}

impl Keys {
    pub fn set<V: Any + Send + Sync>(&self, key: impl Into<String>, value: V) {
        self.map.write().insert(key.into(), Arc::new(value));
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.map.read().get(key).map(Arc::clone)
    }

    /// Typed lookup; `None` when absent or stored with another type
    #[must_use]
    pub fn get_as<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.get(key).and_then(|v| v.downcast::<T>().ok())
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.map.read().contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }

    fn clear_exclusive(&mut self) {
        self.map.get_mut().clear();
    }
}

/// Per-request context handed to every handler
pub struct Context {
    request: Request<Bytes>,
    writer: ResponseWriter,
    params: Params,
    keys: Arc<Keys>,
    handlers: Vec<Handler>,
    index: isize,
    aborted: bool,
    full_path: Option<Arc<str>>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", self.request.method())
            .field("path", &self.request.uri().path())
            .field("full_path", &self.full_path)
            .field("params", &self.params)
            .field("handlers", &self.handlers.len())
            .field("index", &self.index)
            .field("aborted", &self.aborted)
            .finish_non_exhaustive()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(Request::default())
    }
}

impl Context {
    /// Standalone context with an empty chain
    #[must_use]
    pub fn new(request: Request<Bytes>) -> Self {
        Self {
            request,
            writer: ResponseWriter::new(),
            params: Params::new(),
            keys: Arc::new(Keys::default()),
            handlers: Vec::new(),
            index: -1,
            aborted: false,
            full_path: None,
        }
    }

    /// Clear every per-request field and install `request`
    pub(crate) fn reset(&mut self, request: Request<Bytes>) {
        self.request = request;
        self.writer.reset();
        self.params.clear();
        match Arc::get_mut(&mut self.keys) {
            Some(keys) => keys.clear_exclusive(),
            // a background task still holds the old map
            None => self.keys = Arc::new(Keys::default()),
        }
        self.handlers.clear();
        self.index = -1;
        self.aborted = false;
        self.full_path = None;
    }

    /// Install a resolved route; `chain` must already hold the handlers
    pub(crate) fn install(&mut self, params: Params, full_path: Option<Arc<str>>) {
        self.params = params;
        self.full_path = full_path;
        self.index = -1;
    }

    pub(crate) fn chain_mut(&mut self) -> &mut Vec<Handler> {
        &mut self.handlers
    }

    pub(crate) fn take_response(&mut self) -> http::Response<Bytes> {
        self.writer.take_response()
    }

    // ---------------------------------------------------------------------
    // Request

    #[inline]
    #[must_use]
    pub fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    #[inline]
    #[must_use]
    pub fn method(&self) -> &Method {
        self.request.method()
    }

    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    /// Matched route pattern, empty when no route matched
    #[must_use]
    pub fn full_path(&self) -> &str {
        self.full_path.as_deref().unwrap_or("")
    }

    /// First url-decoded value of query parameter `key`
    #[must_use]
    pub fn query(&self, key: &str) -> Option<String> {
        let query = self.request.uri().query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    /// Header value, if present and valid UTF-8
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
    }

    #[must_use]
    pub fn body(&self) -> &Bytes {
        self.request.body()
    }

    /// Path param `name`, or `""` when the route has no such param
    #[must_use]
    pub fn param(&self, name: &str) -> &str {
        self.params.get(name).unwrap_or("")
    }

    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    // ---------------------------------------------------------------------
    // Annotations

    pub fn set<V: Any + Send + Sync>(&self, key: impl Into<String>, value: V) {
        self.keys.set(key, value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.keys.get(key)
    }

    #[must_use]
    pub fn get_as<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.keys.get_as(key)
    }

    /// Value stored under `key`
    ///
    /// # Panics
    ///
    /// When `key` was never set. Use this only for keys an earlier handler
    /// in the same chain is known to set.
    #[must_use]
    pub fn must_get(&self, key: &str) -> Value {
        match self.keys.get(key) {
            Some(v) => v,
            None => panic!("key \"{key}\" does not exist"),
        }
    }

    /// Shared handle to the annotation map for work outliving the handler
    #[must_use]
    pub fn keys(&self) -> Arc<Keys> {
        Arc::clone(&self.keys)
    }

    // ---------------------------------------------------------------------
    // Flow

    /// Run the remaining handlers
    pub fn next(&mut self) {
        self.index += 1;
        while let Some(h) = self.current_handler() {
            h(self);
            self.index += 1;
        }
    }

    fn current_handler(&self) -> Option<Handler> {
        let idx = usize::try_from(self.index).ok()?;
        self.handlers.get(idx).map(Arc::clone)
    }

    /// Skip every handler after the current one
    pub fn abort(&mut self) {
        self.index = isize::try_from(self.handlers.len()).unwrap_or(isize::MAX);
        self.aborted = true;
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Commit `code` and stop the chain
    pub fn abort_with_status(&mut self, code: StatusCode) {
        self.writer.write_header(code);
        self.abort();
    }

    /// Stop the chain and respond with `{"error": message}`
    ///
    /// Any `Content-Type` set earlier is replaced with JSON.
    pub fn fail(&mut self, code: StatusCode, message: impl Into<String>) {
        self.abort();
        self.writer
            .set_header(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        self.json(code, serde_json::json!({ "error": message.into() }));
    }

    // ---------------------------------------------------------------------
    // Response

    pub fn status(&mut self, code: StatusCode) {
        self.writer.write_header(code);
    }

    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.writer.set_header(name, value);
    }

    #[must_use]
    pub fn writer(&self) -> &ResponseWriter {
        &self.writer
    }

    pub fn writer_mut(&mut self) -> &mut ResponseWriter {
        &mut self.writer
    }

    /// Write `code` and, if the status allows a body, the rendered value
    ///
    /// A render failure is logged and aborts the chain.
    pub fn render<R: Render>(&mut self, code: StatusCode, r: R) {
        self.writer.write_header(code);
        if !body_allowed_for_status(code) {
            r.write_content_type(&mut self.writer);
            return;
        }
        if let Err(e) = r.render(&mut self.writer) {
            error!(
                method = %self.request.method(),
                path = %self.request.uri().path(),
                error = %e,
                "Failed to render response"
            );
            self.abort();
        }
    }

    pub fn string(&mut self, code: StatusCode, text: impl Into<String>) {
        self.render(code, Text(text.into()));
    }

    pub fn json<T: Serialize>(&mut self, code: StatusCode, value: T) {
        self.render(code, Json(value));
    }

    pub fn data(&mut self, code: StatusCode, content_type: &'static str, data: impl Into<Bytes>) {
        self.render(
            code,
            Data {
                content_type,
                data: data.into(),
            },
        );
    }

    pub fn redirect(&mut self, code: StatusCode, location: impl Into<String>) {
        self.render(
            code,
            Redirect {
                code,
                location: location.into(),
            },
        );
    }
}
