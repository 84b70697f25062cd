use std::io;
use std::sync::Arc;

use chainrouter::dispatcher::{Dispatcher, Engine};
use chainrouter::middleware::handler;
use chainrouter::runtime_config::RuntimeConfig;
use chainrouter::server::{HttpServer, ServerHandle};
use http::StatusCode;

mod common;
use common::http_client;

fn app() -> Dispatcher {
    let mut engine = Engine::default_stack();
    engine
        .root()
        .get("/hello/:name", [handler(|c| {
            let text = format!("hello {}", c.param("name"));
            c.string(StatusCode::OK, text);
        })])
        .unwrap()
        .post("/echo", [handler(|c| {
            let body = c.body().clone();
            c.data(StatusCode::OK, "application/octet-stream", body);
        })])
        .unwrap();
    engine.build()
}

async fn start(dispatcher: Dispatcher, config: &RuntimeConfig) -> ServerHandle {
    HttpServer::new(Arc::new(dispatcher))
        .with_config(config)
        .start("127.0.0.1:0")
        .await
        .unwrap()
}

#[tokio::test]
async fn test_serves_routes_over_http() {
    let handle = start(app(), &RuntimeConfig::default()).await;
    let addr = handle.local_addr();
    assert_ne!(addr.port(), 0);

    let resp = http_client::get(addr, "/hello/knight").await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body_str(), "hello knight");
    assert_eq!(resp.header("content-type"), Some("text/plain; charset=utf-8"));

    let resp = http_client::get(addr, "/nope").await;
    assert_eq!(resp.status, 404);
    assert_eq!(resp.body_str(), "404 NOT FOUND: /nope");

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_echoes_request_body() {
    let handle = start(app(), &RuntimeConfig::default()).await;
    let resp = http_client::send(handle.local_addr(), "POST", "/echo", &[], b"ping").await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, b"ping");
    assert_eq!(resp.header("content-length"), Some("4"));
    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let config = RuntimeConfig {
        max_body_bytes: 16,
        ..RuntimeConfig::default()
    };
    let handle = start(app(), &config).await;
    let body = vec![b'x'; 64];
    let resp = http_client::send(handle.local_addr(), "POST", "/echo", &[], &body).await;
    assert_eq!(resp.status, 413);
    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unrecovered_panic_becomes_500() {
    let mut engine = Engine::new();
    engine
        .root()
        .get("/boom", [handler(|_| panic!("no recovery installed"))])
        .unwrap()
        .get("/ok", [handler(|c| c.string(StatusCode::OK, "still up"))])
        .unwrap();
    let handle = start(engine.build(), &RuntimeConfig::default()).await;
    let addr = handle.local_addr();

    let resp = http_client::get(addr, "/boom").await;
    assert_eq!(resp.status, 500);

    let resp = http_client::get(addr, "/ok").await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body_str(), "still up");

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_empty_address_is_invalid_input() {
    let err = HttpServer::new(Arc::new(app()))
        .start("  ")
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    assert_eq!(err.to_string(), "server address can't be empty");
}

#[tokio::test]
async fn test_stop_closes_listener() {
    let mut handle = start(app(), &RuntimeConfig::default()).await;
    let addr = handle.local_addr();
    handle.stop();
    handle.join().await.unwrap();

    assert!(tokio::net::TcpStream::connect(addr).await.is_err());
}
