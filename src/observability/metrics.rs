//! Request metrics.
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, status, severity
//! - `http_request_duration_seconds` (histogram): latency by method
//! - `http_requests_suppressed_total` (counter): requests that produced no entry
//!
//! Recording is a no-op until a recorder is installed with [`init_metrics`].

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::policy::Severity;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one logged request.
pub fn record_request(method: &str, status: u16, severity: Severity, latency: Duration) {
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "severity" => severity.as_str()
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(latency.as_secs_f64());
}

/// Record a request whose entry was suppressed.
pub fn record_suppressed(path: &str) {
    metrics::counter!("http_requests_suppressed_total", "path" => path.to_string()).increment(1);
}
