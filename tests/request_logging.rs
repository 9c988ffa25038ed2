//! End-to-end behaviour of the request logger around real axum routes.

use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures_util::{stream, StreamExt};
use serde_json::{json, Value};

use traffic_logger::policy::{ExclusionSet, NOT_LOGGED, TRUNCATION_MARKER};
use traffic_logger::{CorrelationKey, HandlerError, HandlerErrors, LoggingPolicy, Payload, Severity};

mod common;
use common::{logged_app, request, send, TEST_HOSTNAME};

fn routes() -> Router {
    Router::new()
        .route("/api/echo", post(|Json(v): Json<Value>| async move { Json(v) }))
        .route("/api/text", post(|body: String| async move { format!("got {}", body) }))
        .route("/api/users", get(|| async { Json(json!({"users": []})) }))
        .route(
            "/api/broken",
            get(|| async {
                (
                    StatusCode::OK,
                    HandlerErrors::from(HandlerError::private("cache miss storm")),
                    "degraded",
                )
            }),
        )
        .route("/api/crash", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/favicon.ico", get(|| async { "icon" }))
        .route(
            "/favicon-broken",
            get(|| async { (HandlerErrors::from(HandlerError::private("no icon")), "x") }),
        )
        .route("/static/img/logo.png", get(|| async { "PNGDATA" }))
        .route(
            "/api/traced",
            get(|| async { (CorrelationKey::new("trace-42"), "traced").into_response() }),
        )
        .route(
            "/api/stream",
            get(|| async {
                let chunks = (0..10).map(|i| Ok::<_, std::io::Error>(Bytes::from(format!("chunk{:02};", i))));
                Body::from_stream(stream::iter(chunks))
            }),
        )
        .route(
            "/api/panic",
            get(|| async {
                if true {
                    panic!("handler bug");
                }
                "unreachable"
            }),
        )
        .route(
            "/api/hang",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                "never"
            }),
        )
}

#[tokio::test]
async fn test_json_request_and_response_are_structured() {
    let (app, sink, _) = logged_app(LoggingPolicy::default(), routes());

    let (status, body) = send(&app, request("POST", "/api/echo", r#"{"a":1}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Bytes::from_static(br#"{"a":1}"#));

    let entries = sink.entries();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.hostname, TEST_HOSTNAME);
    assert_eq!(entry.status_code, 200);
    assert_eq!(entry.method, "POST");
    assert_eq!(entry.path, "/api/echo");
    assert_eq!(entry.client_ip, "127.0.0.1");
    assert_eq!(entry.data_length, 7);
    assert_eq!(entry.severity, Severity::Info);
    assert_eq!(entry.request_body.to_value(), json!({"a": 1}));
    assert_eq!(entry.response_body.to_value(), json!({"a": 1}));
}

#[tokio::test]
async fn test_handler_reads_replayed_body() {
    let (app, sink, _) = logged_app(LoggingPolicy::default(), routes());

    let (_, body) = send(&app, request("POST", "/api/text", "not-json")).await;
    assert_eq!(body, Bytes::from_static(b"got not-json"));

    let entry = &sink.entries()[0];
    assert_eq!(entry.request_body, Payload::Text("not-json".into()));
    assert_eq!(entry.response_body, Payload::Text("got not-json".into()));
}

#[tokio::test]
async fn test_large_request_body_still_reaches_handler() {
    let policy = LoggingPolicy {
        body_size_limit: 16,
        ..LoggingPolicy::default()
    };
    let (app, sink, _) = logged_app(policy, routes());
    let payload = "x".repeat(10_000);

    let (_, body) = send(&app, request("POST", "/api/text", payload.clone())).await;
    assert_eq!(body.len(), "got ".len() + payload.len());

    let entry = &sink.entries()[0];
    match &entry.request_body {
        Payload::Text(text) => {
            assert!(text.ends_with(TRUNCATION_MARKER));
            assert_eq!(text.len(), 16 + TRUNCATION_MARKER.len());
        }
        other => panic!("expected truncated text, got {:?}", other),
    }
}

#[tokio::test]
async fn test_status_severity_mapping() {
    let (app, sink, _) = logged_app(LoggingPolicy::default(), routes());

    send(&app, request("GET", "/api/users", Body::empty())).await;
    send(&app, request("GET", "/missing", Body::empty())).await;
    send(&app, request("GET", "/api/crash", Body::empty())).await;

    let severities: Vec<_> = sink.entries().iter().map(|e| (e.status_code, e.severity)).collect();
    assert_eq!(
        severities,
        vec![(200, Severity::Info), (404, Severity::Warn), (500, Severity::Error)]
    );
}

#[tokio::test]
async fn test_handler_errors_force_error() {
    let (app, sink, _) = logged_app(LoggingPolicy::default(), routes());

    let (status, body) = send(&app, request("GET", "/api/broken", Body::empty())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Bytes::from_static(b"degraded"));

    let entry = &sink.entries()[0];
    assert_eq!(entry.severity, Severity::Error);
    assert_eq!(entry.message, "Error #01: cache miss storm");
}

#[tokio::test]
async fn test_favicon_suppressed_unless_errors() {
    let policy = LoggingPolicy {
        suppressed_paths: traffic_logger::policy::SuppressionRule::new(["/favicon.ico", "/favicon-broken"]),
        ..LoggingPolicy::default()
    };
    let (app, sink, _) = logged_app(policy, routes());

    let (status, body) = send(&app, request("GET", "/favicon.ico", Body::empty())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Bytes::from_static(b"icon"));
    assert!(sink.is_empty());

    send(&app, request("GET", "/favicon-broken", Body::empty())).await;
    let entries = sink.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, Severity::Error);
}

#[tokio::test]
async fn test_excluded_path_hides_response_body() {
    let policy = LoggingPolicy {
        excluded_paths: ExclusionSet::new(["img"]),
        ..LoggingPolicy::default()
    };
    let (app, sink, _) = logged_app(policy, routes());

    send(&app, request("GET", "/static/img/logo.png", Body::empty())).await;
    send(&app, request("GET", "/api/users", Body::empty())).await;

    let entries = sink.entries();
    assert_eq!(entries[0].response_body.to_value(), json!(NOT_LOGGED));
    assert_eq!(entries[0].data_length, 7);
    assert_eq!(entries[1].response_body.to_value(), json!({"users": []}));
}

#[tokio::test]
async fn test_streamed_response_forwarded_whole_and_logged_capped() {
    let policy = LoggingPolicy {
        body_size_limit: 14,
        ..LoggingPolicy::default()
    };
    let (app, sink, _) = logged_app(policy, routes());

    let (_, body) = send(&app, request("GET", "/api/stream", Body::empty())).await;
    let expected: String = (0..10).map(|i| format!("chunk{:02};", i)).collect();
    assert_eq!(body, Bytes::from(expected.clone()));

    let entry = &sink.entries()[0];
    assert_eq!(entry.data_length, expected.len() as u64);
    assert_eq!(
        entry.response_body,
        Payload::Text(format!("chunk00;chunk0{}", TRUNCATION_MARKER))
    );
}

#[tokio::test]
async fn test_body_logging_toggles() {
    let policy = LoggingPolicy {
        log_request_body: false,
        log_response_body: false,
        ..LoggingPolicy::default()
    };
    let (app, sink, _) = logged_app(policy, routes());

    let (_, body) = send(&app, request("POST", "/api/echo", r#"{"secret":true}"#)).await;
    assert_eq!(body, Bytes::from_static(br#"{"secret":true}"#));

    let entry = &sink.entries()[0];
    assert_eq!(entry.request_body, Payload::NotLogged);
    assert_eq!(entry.response_body, Payload::NotLogged);
    assert_eq!(entry.data_length, 15);
}

#[tokio::test]
async fn test_correlation_key_passthrough() {
    let (app, sink, _) = logged_app(LoggingPolicy::default(), routes());

    send(&app, request("GET", "/api/traced", Body::empty())).await;
    send(&app, request("GET", "/api/users", Body::empty())).await;

    let entries = sink.entries();
    assert_eq!(entries[0].at, Some(json!("trace-42")));
    assert_eq!(entries[1].at, None);
}

#[tokio::test]
async fn test_referer_recorded() {
    let (app, sink, _) = logged_app(LoggingPolicy::default(), routes());

    let mut req = request("GET", "/api/users", Body::empty());
    req.headers_mut()
        .insert("referer", "https://example.com/dashboard".parse().unwrap());
    send(&app, req).await;

    assert_eq!(sink.entries()[0].referer, "https://example.com/dashboard");
}

#[tokio::test]
async fn test_one_entry_per_concurrent_request() {
    let (app, sink, _) = logged_app(LoggingPolicy::default(), routes());

    let mut handles = Vec::new();
    for i in 0..50 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let path = if i % 2 == 0 { "/api/users" } else { "/missing" };
            send(&app, request("GET", path, Body::empty())).await
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let entries = sink.entries();
    assert_eq!(entries.len(), 50);
    assert_eq!(entries.iter().filter(|e| e.status_code == 404).count(), 25);
}

#[tokio::test]
async fn test_abandoned_request_still_logged() {
    let (app, sink, _) = logged_app(LoggingPolicy::default(), routes());

    let pending = send(&app, request("GET", "/api/hang", Body::empty()));
    assert!(tokio::time::timeout(Duration::from_millis(50), pending).await.is_err());

    let entries = sink.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status_code, 499);
    assert_eq!(entries[0].severity, Severity::Warn);
}

#[tokio::test]
async fn test_stalled_upload_logged_with_bytes_read() {
    let (app, sink, _) = logged_app(LoggingPolicy::default(), routes());

    let chunks = stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from_static(b"abc"))]).chain(stream::pending());
    let pending = send(&app, request("POST", "/api/text", Body::from_stream(chunks)));
    assert!(tokio::time::timeout(Duration::from_millis(50), pending).await.is_err());

    let entries = sink.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status_code, 499);
    assert_eq!(entries[0].severity, Severity::Warn);
    assert_eq!(entries[0].request_body, Payload::Text("abc".into()));
    assert_eq!(entries[0].data_length, 0);
}

#[tokio::test]
async fn test_panicking_handler_logged_as_server_error() {
    let (app, sink, _) = logged_app(LoggingPolicy::default(), routes());

    let outcome = tokio::spawn(async move { send(&app, request("GET", "/api/panic", Body::empty())).await }).await;
    assert!(outcome.unwrap_err().is_panic());

    let entries = sink.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status_code, 500);
    assert_eq!(entries[0].severity, Severity::Error);
    assert_eq!(entries[0].message, "Error #01: handler panicked");
}

#[tokio::test]
async fn test_policy_swap_applies_to_new_requests() {
    let (app, sink, logger) = logged_app(LoggingPolicy::default(), routes());

    send(&app, request("GET", "/api/users", Body::empty())).await;
    logger.policy().replace(LoggingPolicy {
        log_response_body: false,
        ..LoggingPolicy::default()
    });
    send(&app, request("GET", "/api/users", Body::empty())).await;

    let entries = sink.entries();
    assert!(entries[0].response_body.is_logged());
    assert!(!entries[1].response_body.is_logged());
}
