//! The per-request log entry.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::policy::{Payload, Severity};

/// One structured record describing a finished request.
///
/// Field names serialize in camelCase so JSON sinks keep the
/// `statusCode` / `clientIP` / `requestBody` shape operators query on.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub hostname: String,
    pub status_code: u16,
    /// Processing time in microseconds, rounded up.
    pub latency: u64,
    #[serde(rename = "clientIP")]
    pub client_ip: String,
    pub method: String,
    pub path: String,
    pub referer: String,
    /// Bytes sent in the response body.
    pub data_length: u64,
    /// Upstream correlation key, passed through untouched.
    pub at: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub request_body: Payload,
    pub response_body: Payload,
    pub started_at: DateTime<Utc>,
    pub severity: Severity,
    pub message: String,
}

impl LogEntry {
    /// Correlation key rendered for text sinks; empty when absent.
    pub fn at_display(&self) -> String {
        match &self.at {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}
