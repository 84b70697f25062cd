use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::dispatcher::Dispatcher;
use crate::middleware::panic_message;
use crate::runtime_config::RuntimeConfig;

fn plain(status: StatusCode, text: &'static str) -> Response<Bytes> {
    let mut response = Response::new(Bytes::from_static(text.as_bytes()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// State shared by every connection of one server
struct ServiceState {
    dispatcher: Arc<Dispatcher>,
    max_body_bytes: usize,
}

impl ServiceState {
    async fn handle(&self, req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
        let (parts, body) = req.into_parts();
        let body = match Limited::new(body, self.max_body_bytes).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                debug!(path = %parts.uri.path(), limit = self.max_body_bytes, "Request body too large");
                return Ok(plain(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large").map(Full::new));
            }
            Err(e) => {
                debug!(path = %parts.uri.path(), error = %e, "Failed to read request body");
                return Ok(plain(StatusCode::BAD_REQUEST, "Bad Request").map(Full::new));
            }
        };

        let method = parts.method.clone();
        let path = parts.uri.path().to_string();
        let request = Request::from_parts(parts, body);
        let dispatcher = Arc::clone(&self.dispatcher);

        // handlers are synchronous and may block
        let response = match tokio::task::spawn_blocking(move || dispatcher.serve(request)).await {
            Ok(response) => response,
            Err(e) if e.is_panic() => {
                let payload = e.into_panic();
                error!(
                    method = %method,
                    path = %path,
                    panic_message = %panic_message(payload.as_ref()),
                    "Handler panicked without recovery middleware"
                );
                plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
            Err(e) => {
                error!(method = %method, path = %path, error = %e, "Handler task cancelled");
                plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        };
        Ok(response.map(Full::new))
    }
}

/// HTTP/1.1 front end for a [`Dispatcher`]
pub struct HttpServer {
    dispatcher: Arc<Dispatcher>,
    max_body_bytes: usize,
    shutdown_timeout: Duration,
}

/// Handle to a running HTTP server
///
/// Dropping the handle stops the accept loop as well.
pub struct ServerHandle {
    addr: SocketAddr,
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// The bound address, with the real port when `:0` was requested
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections and start draining
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            if tx.send(()).is_err() {
                debug!(addr = %self.addr, "Server already stopped");
            }
        }
    }

    /// Wait for the server task to finish
    ///
    /// # Errors
    ///
    /// When the server task panicked or was cancelled.
    pub async fn join(self) -> io::Result<()> {
        self.task.await.map_err(io::Error::other)
    }

    /// [`Self::stop`] then [`Self::join`]
    ///
    /// # Errors
    ///
    /// Same as [`Self::join`].
    pub async fn shutdown(mut self) -> io::Result<()> {
        self.stop();
        self.join().await
    }
}

impl HttpServer {
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        let defaults = RuntimeConfig::default();
        Self {
            dispatcher,
            max_body_bytes: defaults.max_body_bytes,
            shutdown_timeout: defaults.shutdown_timeout(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: &RuntimeConfig) -> Self {
        self.max_body_bytes = config.max_body_bytes;
        self.shutdown_timeout = config.shutdown_timeout();
        self
    }

    /// Bind `addr` and serve in a background task
    ///
    /// Must be called within a tokio runtime.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an empty address, or the bind error.
    pub async fn start(self, addr: &str) -> io::Result<ServerHandle> {
        if addr.trim().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "server address can't be empty",
            ));
        }
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let (stop_tx, stop_rx) = oneshot::channel();

        let state = Arc::new(ServiceState {
            dispatcher: self.dispatcher,
            max_body_bytes: self.max_body_bytes,
        });
        let task = tokio::spawn(accept_loop(listener, state, stop_rx, self.shutdown_timeout));

        info!(addr = %local_addr, "HTTP server listening");
        Ok(ServerHandle {
            addr: local_addr,
            stop_tx: Some(stop_tx),
            task,
        })
    }

    /// Serve until Ctrl-C, then drain connections
    ///
    /// # Errors
    ///
    /// Bind errors, signal handler installation errors, or a failed server task.
    pub async fn run_until_signal(self, addr: &str) -> io::Result<()> {
        let mut handle = self.start(addr).await?;
        tokio::signal::ctrl_c().await?;
        info!("Shutdown signal received");
        handle.stop();
        handle.join().await
    }
}

async fn accept_loop(
    listener: TcpListener,
    state: Arc<ServiceState>,
    mut stop_rx: oneshot::Receiver<()>,
    shutdown_timeout: Duration,
) {
    let graceful = GracefulShutdown::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "Failed to accept connection");
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        continue;
                    }
                };
                let state = Arc::clone(&state);
                let service = service_fn(move |req| {
                    let state = Arc::clone(&state);
                    async move { state.handle(req).await }
                });
                let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
                let conn = graceful.watch(conn);
                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        debug!(peer = %peer, error = %e, "Connection closed with error");
                    }
                });
            }
            _ = &mut stop_rx => break,
        }
    }

    drop(listener);
    tokio::select! {
        () = graceful.shutdown() => info!("All connections drained"),
        () = tokio::time::sleep(shutdown_timeout) => {
            warn!(timeout_secs = shutdown_timeout.as_secs(), "Shutdown timeout elapsed, dropping open connections");
        }
    }
}
