//! Response renderers.
//!
//! A renderer knows its content type and how to serialize itself into a
//! [`ResponseWriter`]. [`Context::render`](crate::dispatcher::Context::render)
//! decides whether the status allows a body at all and calls
//! [`Render::render`] only when it does.

use std::fmt;

use bytes::Bytes;
use http::header::{HeaderValue, LOCATION};
use http::StatusCode;
use serde::Serialize;

use crate::server::ResponseWriter;

const PLAIN_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
pub(crate) const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Render failure
#[derive(Debug)]
pub enum RenderError {
    /// Redirects must use a 3xx code or 201 Created
    InvalidRedirect { code: u16 },
    /// The redirect target is not a valid header value
    InvalidLocation { location: String },
    /// The value could not be serialized
    Serialize(serde_json::Error),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::InvalidRedirect { code } => {
                write!(f, "cannot redirect with status code {code}")
            }
            RenderError::InvalidLocation { location } => {
                write!(f, "invalid redirect location '{location}'")
            }
            RenderError::Serialize(e) => write!(f, "failed to serialize response: {e}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Serialize(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(e: serde_json::Error) -> Self {
        RenderError::Serialize(e)
    }
}

/// Something that can be written as a response body
pub trait Render {
    /// Set the content type on `w` if none is present
    fn write_content_type(&self, w: &mut ResponseWriter);

    /// Write content type and body
    ///
    /// # Errors
    ///
    /// Renderer specific; see [`RenderError`].
    fn render(&self, w: &mut ResponseWriter) -> Result<(), RenderError>;
}

/// Plain UTF-8 text
#[derive(Debug, Clone)]
pub struct Text(pub String);

impl Render for Text {
    fn write_content_type(&self, w: &mut ResponseWriter) {
        w.set_content_type_if_absent(PLAIN_CONTENT_TYPE);
    }

    fn render(&self, w: &mut ResponseWriter) -> Result<(), RenderError> {
        self.write_content_type(w);
        w.write(self.0.as_bytes());
        Ok(())
    }
}

/// Raw bytes with a caller supplied content type
#[derive(Debug, Clone)]
pub struct Data {
    pub content_type: &'static str,
    pub data: Bytes,
}

impl Render for Data {
    fn write_content_type(&self, w: &mut ResponseWriter) {
        w.set_content_type_if_absent(self.content_type);
    }

    fn render(&self, w: &mut ResponseWriter) -> Result<(), RenderError> {
        self.write_content_type(w);
        w.write(&self.data);
        Ok(())
    }
}

/// JSON serialized with serde_json
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

impl<T: Serialize> Render for Json<T> {
    fn write_content_type(&self, w: &mut ResponseWriter) {
        w.set_content_type_if_absent(JSON_CONTENT_TYPE);
    }

    fn render(&self, w: &mut ResponseWriter) -> Result<(), RenderError> {
        self.write_content_type(w);
        let bytes = serde_json::to_vec(&self.0)?;
        w.write(&bytes);
        Ok(())
    }
}

/// Redirect to `location`
///
/// Only 3xx codes and 201 Created are accepted.
#[derive(Debug, Clone)]
pub struct Redirect {
    pub code: StatusCode,
    pub location: String,
}

impl Redirect {
    fn code_allowed(code: StatusCode) -> bool {
        code.is_redirection() || code == StatusCode::CREATED
    }
}

impl Render for Redirect {
    fn write_content_type(&self, _w: &mut ResponseWriter) {}

    fn render(&self, w: &mut ResponseWriter) -> Result<(), RenderError> {
        if !Self::code_allowed(self.code) {
            return Err(RenderError::InvalidRedirect {
                code: self.code.as_u16(),
            });
        }
        let location =
            HeaderValue::from_str(&self.location).map_err(|_| RenderError::InvalidLocation {
                location: self.location.clone(),
            })?;
        w.set_header(LOCATION, location);
        w.write_header(self.code);
        Ok(())
    }
}

/// Whether a status code may carry a body
#[must_use]
pub fn body_allowed_for_status(status: StatusCode) -> bool {
    !(status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONTENT_TYPE;

    #[test]
    fn test_text_render() {
        let mut w = ResponseWriter::new();
        Text("hi".to_string()).render(&mut w).unwrap();
        assert_eq!(w.headers()[CONTENT_TYPE], PLAIN_CONTENT_TYPE);
        assert_eq!(w.body(), b"hi");
    }

    #[test]
    fn test_json_render() {
        let mut w = ResponseWriter::new();
        Json(serde_json::json!({"name": "knight"}))
            .render(&mut w)
            .unwrap();
        assert_eq!(w.headers()[CONTENT_TYPE], JSON_CONTENT_TYPE);
        let v: serde_json::Value = serde_json::from_slice(w.body()).unwrap();
        assert_eq!(v["name"], "knight");
    }

    #[test]
    fn test_data_keeps_existing_content_type() {
        let mut w = ResponseWriter::new();
        w.set_header(CONTENT_TYPE, HeaderValue::from_static("image/png"));
        Data {
            content_type: "application/octet-stream",
            data: Bytes::from_static(b"\x89PNG"),
        }
        .render(&mut w)
        .unwrap();
        assert_eq!(w.headers()[CONTENT_TYPE], "image/png");
    }

    #[test]
    fn test_redirect_codes() {
        let mut w = ResponseWriter::new();
        Redirect {
            code: StatusCode::MOVED_PERMANENTLY,
            location: "/new".to_string(),
        }
        .render(&mut w)
        .unwrap();
        assert_eq!(w.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(w.headers()[LOCATION], "/new");

        let mut w = ResponseWriter::new();
        let err = Redirect {
            code: StatusCode::OK,
            location: "/new".to_string(),
        }
        .render(&mut w)
        .unwrap_err();
        assert!(matches!(err, RenderError::InvalidRedirect { code: 200 }));
        assert!(!w.written());
    }

    #[test]
    fn test_body_allowed_for_status() {
        assert!(!body_allowed_for_status(StatusCode::CONTINUE));
        assert!(!body_allowed_for_status(StatusCode::NO_CONTENT));
        assert!(!body_allowed_for_status(StatusCode::NOT_MODIFIED));
        assert!(body_allowed_for_status(StatusCode::OK));
        assert!(body_allowed_for_status(StatusCode::NOT_FOUND));
    }
}
