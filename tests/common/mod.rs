#![allow(dead_code)]

use std::sync::Arc;

use bytes::Bytes;
use chainrouter::dispatcher::Dispatcher;
use chainrouter::middleware::{handler, Handler};
use http::{Method, Request, Response};
use parking_lot::Mutex;

pub fn request(method: Method, path: &str) -> Request<Bytes> {
    Request::builder()
        .method(method)
        .uri(path)
        .body(Bytes::new())
        .unwrap()
}

pub fn get(dispatcher: &Dispatcher, path: &str) -> Response<Bytes> {
    dispatcher.serve(request(Method::GET, path))
}

pub fn body_str(response: &Response<Bytes>) -> &str {
    std::str::from_utf8(response.body()).unwrap()
}

/// Ordered log of labels shared between handlers of a test
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, label: impl Into<String>) {
        self.0.lock().push(label.into());
    }

    /// Handler that records `label` and lets the chain continue
    pub fn mark(&self, label: &'static str) -> Handler {
        let rec = self.clone();
        handler(move |_| rec.push(label))
    }

    /// Handler that records `label:before`, runs the rest, then `label:after`
    pub fn around(&self, label: &'static str) -> Handler {
        let rec = self.clone();
        handler(move |c| {
            rec.push(format!("{label}:before"));
            c.next();
            rec.push(format!("{label}:after"));
        })
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn count(&self, label: &str) -> usize {
        self.0.lock().iter().filter(|l| *l == label).count()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

pub mod test_tracing {
    use tracing::subscriber::DefaultGuard;

    /// Route this thread's log output through the test harness writer
    pub fn init() -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

pub mod http_client {
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    pub struct RawResponse {
        pub status: u16,
        pub headers: Vec<(String, String)>,
        pub body: Vec<u8>,
    }

    impl RawResponse {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }

        pub fn body_str(&self) -> &str {
            std::str::from_utf8(&self.body).unwrap()
        }
    }

    /// Send one HTTP/1.1 request with `Connection: close` and read the reply
    pub async fn send(
        addr: SocketAddr,
        method: &str,
        path: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> RawResponse {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let mut head = format!(
            "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\nContent-Length: {}\r\n",
            body.len()
        );
        for (k, v) in headers {
            head.push_str(&format!("{k}: {v}\r\n"));
        }
        head.push_str("\r\n");
        stream.write_all(head.as_bytes()).await.unwrap();
        stream.write_all(body).await.unwrap();

        let mut raw = Vec::new();
        // a reset after the full reply still leaves the reply in `raw`
        let _ = stream.read_to_end(&mut raw).await;
        parse(&raw)
    }

    fn parse(raw: &[u8]) -> RawResponse {
        let split = raw
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .expect("response head terminator");
        let head = std::str::from_utf8(&raw[..split]).unwrap();
        let mut lines = head.split("\r\n");
        let status_line = lines.next().unwrap();
        let status = status_line
            .split_whitespace()
            .nth(1)
            .unwrap()
            .parse()
            .unwrap();
        let headers = lines
            .filter_map(|l| l.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();
        RawResponse {
            status,
            headers,
            body: raw[split + 4..].to_vec(),
        }
    }

    pub async fn get(addr: SocketAddr, path: &str) -> RawResponse {
        send(addr, "GET", path, &[], b"").await
    }
}
