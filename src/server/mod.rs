//! HTTP transport and the response sink handlers write into.

pub mod http_server;
pub mod response;

pub use http_server::{HttpServer, ServerHandle};
pub use response::ResponseWriter;
