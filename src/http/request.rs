//! Request-side facts captured before the handler runs.
//!
//! # Responsibilities
//! - Record method, path, referer and start time at request entry
//! - Resolve the client IP (forwarding headers first, then the peer address)
//! - Pick up an upstream correlation key and request ID if present

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, Request};
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::capture::CapturedRequestBody;
use crate::http::response::CorrelationKey;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Immutable per-request facts, consumed once when the entry is built.
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    pub start: Instant,
    pub started_at: DateTime<Utc>,
    pub method: String,
    /// Path at entry; later layers may rewrite the URI.
    pub path: String,
    pub client_ip: String,
    pub referer: String,
    pub request_id: Option<String>,
    pub correlation: Option<Value>,
    pub body: CapturedRequestBody,
}

impl RequestSnapshot {
    /// Capture everything except the body.
    pub fn capture<B>(req: &Request<B>) -> Self {
        Self {
            start: Instant::now(),
            started_at: Utc::now(),
            method: req.method().to_string(),
            path: req.uri().path().to_string(),
            client_ip: client_ip(req),
            referer: header_str(req.headers(), header::REFERER.as_str()).unwrap_or_default(),
            request_id: header_str(req.headers(), X_REQUEST_ID),
            correlation: req
                .extensions()
                .get::<CorrelationKey>()
                .map(|key| key.0.clone()),
            body: CapturedRequestBody::empty(),
        }
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Client address: first `X-Forwarded-For` hop, then `X-Real-IP`, then the
/// socket peer. Empty when none is known.
pub fn client_ip<B>(req: &Request<B>) -> String {
    let headers = req.headers();

    if let Some(forwarded) = header_str(headers, "x-forwarded-for") {
        if let Some(first) = forwarded.split(',').map(str::trim).find(|s| !s.is_empty()) {
            return first.to_string();
        }
    }

    if let Some(real_ip) = header_str(headers, "x-real-ip") {
        return real_ip;
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default()
}
