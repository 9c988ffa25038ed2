//! Request logging middleware.
//!
//! # Lifecycle of one request
//! ```text
//! entry:     load policy snapshot, capture RequestSnapshot, tee request body
//! handler:   next.run(req) with the replay body
//! response:  take HandlerErrors / CorrelationKey, wrap body in CaptureBody
//! body end:  latency, payload formatting, severity → exactly one LogEntry
//! ```
//!
//! If the middleware future is dropped before the handler produces a response
//! (client disconnect, outer cancellation, a stalled upload) the entry is still
//! emitted, with status 499 and whatever was captured so far. A panic unwinding
//! through the middleware is logged as a 500 at ERROR instead.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
    Router,
};
use bytes::{Bytes, BytesMut};
use serde_json::Value;
use sysinfo::System;

use crate::capture::{tee_body_into, CaptureBody, CapturedRequestBody, ResponseSnapshot, StreamEnd, TeeOutcome};
use crate::http::request::RequestSnapshot;
use crate::http::response::{CorrelationKey, HandlerErrors};
use crate::observability::{metrics, LogEntry, LogSink};
use crate::policy::{classify, Classification, Formatted, HandlerError, LoggingPolicy, PolicyHandle};

/// Marker used when the host name cannot be resolved.
pub const UNKNOWN_HOSTNAME: &str = "unknown";

/// Status recorded for requests abandoned before the handler responded.
const CLIENT_CLOSED_REQUEST: u16 = 499;

/// Error attached to entries of requests whose handler panicked.
const HANDLER_PANICKED: &str = "handler panicked";

/// Host name of this machine, or [`UNKNOWN_HOSTNAME`].
pub fn resolve_hostname() -> String {
    hostname_or_unknown(System::host_name())
}

fn hostname_or_unknown(name: Option<String>) -> String {
    name.filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_HOSTNAME.to_string())
}

/// Latency in whole microseconds, rounded up.
pub fn latency_micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_nanos().div_ceil(1000)).unwrap_or(u64::MAX)
}

/// Builds and emits one entry per request.
pub struct RequestLogger {
    policy: PolicyHandle,
    hostname: String,
    sink: Arc<dyn LogSink>,
}

impl RequestLogger {
    pub fn new(policy: LoggingPolicy, sink: Arc<dyn LogSink>) -> Self {
        Self::with_hostname(policy, sink, resolve_hostname())
    }

    pub fn with_hostname(policy: LoggingPolicy, sink: Arc<dyn LogSink>, hostname: impl Into<String>) -> Self {
        Self {
            policy: PolicyHandle::new(policy),
            hostname: hostname.into(),
            sink,
        }
    }

    pub fn policy(&self) -> &PolicyHandle {
        &self.policy
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Run one request through `next`, logging it once its response body ends.
    pub async fn handle(self: Arc<Self>, req: Request, next: Next) -> Response {
        let policy = self.policy.load();
        let capture_limit = policy.log_request_body.then_some(policy.body_size_limit);
        let snapshot = RequestSnapshot::capture(&req);

        let mut guard = InFlight {
            pending: Some(Pending {
                logger: self,
                policy,
                request: snapshot,
            }),
            partial_body: None,
        };

        let req = match capture_limit {
            Some(limit) => {
                let (parts, body) = req.into_parts();
                let buf = guard.partial_body.insert(BytesMut::new());
                let teed = tee_body_into(body, limit, buf).await;
                guard.partial_body = None;
                if let Some(pending) = guard.pending.as_mut() {
                    pending.request.body = teed.captured;
                }
                Request::from_parts(parts, teed.replay)
            }
            None => req,
        };

        let response = next.run(req).await;

        let Some(pending) = guard.pending.take() else {
            return response;
        };
        pending.wrap_response(response)
    }

    /// Turn the finished request into an entry, or `None` when suppressed.
    pub fn build_entry(
        &self,
        policy: &LoggingPolicy,
        request: RequestSnapshot,
        response: &ResponseSnapshot,
        errors: &[HandlerError],
        correlation: Option<Value>,
        elapsed: Duration,
    ) -> Option<LogEntry> {
        let (severity, message) = match classify(response.status, errors, &request.path, &policy.suppressed_paths) {
            Classification::Emit { severity, message } => (severity, message),
            Classification::Suppress => return None,
        };

        let formatter = policy.formatter();

        let request_body = if policy.log_request_body {
            let total = if request.body.is_truncated() {
                u64::MAX
            } else {
                request.body.bytes.len() as u64
            };
            formatter.format_captured(&request.body.bytes, total)
        } else {
            Formatted::not_logged()
        };

        let response_body = if policy.logs_response_body(&request.path) {
            formatter.format_captured(&response.retained, response.bytes_written)
        } else {
            Formatted::not_logged()
        };

        Some(LogEntry {
            hostname: self.hostname.clone(),
            status_code: response.status.as_u16(),
            latency: latency_micros(elapsed),
            client_ip: request.client_ip,
            method: request.method,
            path: request.path,
            referer: request.referer,
            data_length: response.bytes_written,
            at: correlation,
            request_id: request.request_id,
            request_body: request_body.payload,
            response_body: response_body.payload,
            started_at: request.started_at,
            severity,
            message,
        })
    }

    fn complete(
        &self,
        policy: &LoggingPolicy,
        request: RequestSnapshot,
        response: ResponseSnapshot,
        errors: Vec<HandlerError>,
        correlation: Option<Value>,
    ) {
        let elapsed = request.start.elapsed();
        let method = request.method.clone();
        let path = request.path.clone();

        if response.end != StreamEnd::Complete {
            tracing::debug!(
                method = %method,
                path = %path,
                end = response.end.as_str(),
                bytes_written = response.bytes_written,
                "Response did not complete"
            );
        }

        match self.build_entry(policy, request, &response, &errors, correlation, elapsed) {
            Some(entry) => {
                metrics::record_request(&method, entry.status_code, entry.severity, elapsed);
                self.sink.emit(entry);
            }
            None => metrics::record_suppressed(&path),
        }
    }
}

/// Request state waiting for the response to finish.
struct Pending {
    logger: Arc<RequestLogger>,
    policy: Arc<LoggingPolicy>,
    request: RequestSnapshot,
}

impl Pending {
    fn wrap_response(self, response: Response) -> Response {
        let (mut parts, body) = response.into_parts();

        let errors = parts
            .extensions
            .remove::<HandlerErrors>()
            .map(|errors| errors.0)
            .unwrap_or_default();
        let correlation = parts
            .extensions
            .get::<CorrelationKey>()
            .map(|key| key.0.clone())
            .or_else(|| self.request.correlation.clone());

        let retain = if self.policy.logs_response_body(&self.request.path) {
            self.policy.body_size_limit
        } else {
            0
        };

        let Pending {
            logger,
            policy,
            request,
        } = self;
        let on_finish = Box::new(move |snapshot: ResponseSnapshot| {
            logger.complete(&policy, request, snapshot, errors, correlation);
        });

        let body = CaptureBody::new(body, parts.status, retain, on_finish);
        Response::from_parts(parts, Body::new(body))
    }
}

/// Emits the entry for a request whose handler never returned.
struct InFlight {
    pending: Option<Pending>,
    /// Request bytes read so far; `Some` only while the body is being teed.
    partial_body: Option<BytesMut>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let Some(mut pending) = self.pending.take() else {
            return;
        };

        if let Some(partial) = self.partial_body.take() {
            pending.request.body = CapturedRequestBody {
                bytes: partial.freeze(),
                outcome: TeeOutcome::Partial,
            };
        }

        let (status, errors) = if std::thread::panicking() {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                vec![HandlerError::private(HANDLER_PANICKED)],
            )
        } else {
            let status = StatusCode::from_u16(CLIENT_CLOSED_REQUEST).unwrap_or(StatusCode::REQUEST_TIMEOUT);
            (status, Vec::new())
        };

        let snapshot = ResponseSnapshot {
            status,
            bytes_written: 0,
            retained: Bytes::new(),
            end: StreamEnd::Aborted,
        };
        let correlation = pending.request.correlation.clone();
        pending
            .logger
            .complete(&pending.policy, pending.request, snapshot, errors, correlation);
    }
}

/// `axum::middleware::from_fn_with_state` entry point.
pub async fn request_logger_middleware(
    State(logger): State<Arc<RequestLogger>>,
    req: Request,
    next: Next,
) -> Response {
    logger.handle(req, next).await
}

/// Wrap every route of `router` with request logging.
pub fn with_request_logging<S>(router: Router<S>, logger: Arc<RequestLogger>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(axum::middleware::from_fn_with_state(logger, request_logger_middleware))
}
