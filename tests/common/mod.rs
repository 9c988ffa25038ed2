//! Shared helpers for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::ConnectInfo,
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt;

use traffic_logger::{with_request_logging, LoggingPolicy, MemorySink, RequestLogger};

#[allow(dead_code)]
pub const TEST_HOSTNAME: &str = "test-host";

/// Wrap `routes` with a request logger writing to a fresh `MemorySink`.
#[allow(dead_code)]
pub fn logged_app(policy: LoggingPolicy, routes: Router) -> (Router, Arc<MemorySink>, Arc<RequestLogger>) {
    let sink = Arc::new(MemorySink::new());
    let logger = Arc::new(RequestLogger::with_hostname(policy, sink.clone(), TEST_HOSTNAME));
    (with_request_logging(routes, logger.clone()), sink, logger)
}

/// Build a request carrying a peer address, as a real listener would.
#[allow(dead_code)]
pub fn request(method: &str, uri: &str, body: impl Into<Body>) -> Request<Body> {
    let mut req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();
    req.extensions_mut()
        .insert(ConnectInfo("127.0.0.1:40000".parse::<SocketAddr>().unwrap()));
    req
}

/// Send one request and read the whole response body.
#[allow(dead_code)]
pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Bytes) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body)
}
