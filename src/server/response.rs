//! Response-state capsule owned by a single request context.

use bytes::{Bytes, BytesMut};
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Response, StatusCode};
use tracing::warn;

/// Buffered response sink
///
/// Handlers write the status line once, add headers, and append body bytes.
/// Nothing reaches the network until the chain has finished and the
/// transport calls [`ResponseWriter::into_response`].
#[derive(Debug)]
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
    header_written: bool,
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseWriter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
            header_written: false,
        }
    }

    /// Clear all state for reuse by the next request
    pub fn reset(&mut self) {
        self.status = StatusCode::OK;
        self.headers.clear();
        self.body.clear();
        self.header_written = false;
    }

    /// Status that will be sent; 200 until something else is written
    #[inline]
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Whether the status line has been committed
    #[inline]
    #[must_use]
    pub fn written(&self) -> bool {
        self.header_written
    }

    /// Body bytes buffered so far
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.body.len()
    }

    #[inline]
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Commit the status code
    ///
    /// Only the first call has an effect; later calls are logged and ignored.
    pub fn write_header(&mut self, status: StatusCode) {
        if self.header_written {
            if status != self.status {
                warn!(
                    current = self.status.as_u16(),
                    attempted = status.as_u16(),
                    "Headers were already written, ignoring status change"
                );
            }
            return;
        }
        self.status = status;
        self.header_written = true;
    }

    /// Append body bytes, committing a 200 status if none was written
    pub fn write(&mut self, data: &[u8]) -> usize {
        if !self.header_written {
            self.write_header(StatusCode::OK);
        }
        self.body.extend_from_slice(data);
        data.len()
    }

    /// Set a header, replacing any existing value
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Set `Content-Type` unless one is already present
    pub fn set_content_type_if_absent(&mut self, content_type: &'static str) {
        if !self.headers.contains_key(CONTENT_TYPE) {
            self.headers
                .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
    }

    /// Move the buffered response out and reset the writer
    ///
    /// The body buffer keeps its spare capacity, and once the returned body
    /// is dropped the next `write` can reclaim the whole allocation.
    pub fn take_response(&mut self) -> Response<Bytes> {
        let mut response = Response::new(self.body.split().freeze());
        *response.status_mut() = self.status;
        *response.headers_mut() = std::mem::replace(&mut self.headers, HeaderMap::new());
        self.status = StatusCode::OK;
        self.header_written = false;
        response
    }

    /// Build the final HTTP response
    #[must_use]
    pub fn into_response(mut self) -> Response<Bytes> {
        self.take_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_response_resets_and_keeps_buffer() {
        let mut w = ResponseWriter::new();
        w.body.reserve(4096);
        w.set_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        w.write_header(StatusCode::CREATED);
        w.write(&[b'x'; 1000]);

        let resp = w.take_response();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(resp.body().len(), 1000);
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/plain");

        assert_eq!(w.status(), StatusCode::OK);
        assert!(!w.written());
        assert_eq!(w.size(), 0);
        assert!(w.headers().is_empty());
        assert!(w.body.capacity() >= 3000);

        drop(resp);
        w.write(b"next");
        assert_eq!(w.take_response().body().as_ref(), b"next");
    }

    #[test]
    fn test_defaults() {
        let w = ResponseWriter::new();
        assert_eq!(w.status(), StatusCode::OK);
        assert!(!w.written());
        assert_eq!(w.size(), 0);
    }

    #[test]
    fn test_write_header_first_wins() {
        let mut w = ResponseWriter::new();
        w.write_header(StatusCode::NOT_FOUND);
        w.write_header(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(w.status(), StatusCode::NOT_FOUND);
        assert!(w.written());
    }

    #[test]
    fn test_write_commits_ok() {
        let mut w = ResponseWriter::new();
        assert_eq!(w.write(b"hello"), 5);
        w.write_header(StatusCode::CREATED);
        assert_eq!(w.status(), StatusCode::OK);
        assert_eq!(w.body(), b"hello");
    }

    #[test]
    fn test_content_type_only_if_absent() {
        let mut w = ResponseWriter::new();
        w.set_header(CONTENT_TYPE, HeaderValue::from_static("text/html"));
        w.set_content_type_if_absent("text/plain");
        assert_eq!(w.headers()[CONTENT_TYPE], "text/html");
    }

    #[test]
    fn test_into_response() {
        let mut w = ResponseWriter::new();
        w.write_header(StatusCode::ACCEPTED);
        w.write(b"queued");
        let resp = w.into_response();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert_eq!(resp.body().as_ref(), b"queued");
    }

    #[test]
    fn test_reset() {
        let mut w = ResponseWriter::new();
        w.write_header(StatusCode::IM_A_TEAPOT);
        w.write(b"x");
        w.reset();
        assert_eq!(w.status(), StatusCode::OK);
        assert!(!w.written());
        assert!(w.headers().is_empty());
        assert_eq!(w.size(), 0);
    }
}
