//! Log sinks.
//!
//! The request logger hands every finished `LogEntry` to a `LogSink`.
//! Transport, formatting and destination belong to the sink.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::observability::entry::LogEntry;
use crate::policy::Severity;

/// `tracing` target used for access log events.
pub const ACCESS_LOG_TARGET: &str = "traffic_logger::access";

/// Destination for finished request entries.
pub trait LogSink: Send + Sync {
    fn emit(&self, entry: LogEntry);
}

/// Emits each entry as one `tracing` event with structured fields.
#[derive(Debug, Clone)]
pub struct TracingSink {
    time_format: String,
}

impl TracingSink {
    /// `time_format` is a chrono format string for the `started_at` field.
    pub fn new(time_format: impl Into<String>) -> Self {
        Self {
            time_format: time_format.into(),
        }
    }
}

macro_rules! access_event {
    ($level:ident, $entry:expr, $started_at:expr) => {
        tracing::$level!(
            target: ACCESS_LOG_TARGET,
            hostname = %$entry.hostname,
            status_code = $entry.status_code,
            latency = $entry.latency,
            client_ip = %$entry.client_ip,
            method = %$entry.method,
            path = %$entry.path,
            referer = %$entry.referer,
            data_length = $entry.data_length,
            at = %$entry.at_display(),
            request_id = $entry.request_id.as_deref(),
            request_body = %$entry.request_body,
            response_body = %$entry.response_body,
            started_at = %$started_at,
            "{}",
            $entry.message
        )
    };
}

impl LogSink for TracingSink {
    fn emit(&self, entry: LogEntry) {
        let started_at = entry.started_at.format(&self.time_format);
        match entry.severity {
            Severity::Info => access_event!(info, entry, started_at),
            Severity::Warn => access_event!(warn, entry, started_at),
            Severity::Error => access_event!(error, entry, started_at),
        }
    }
}

/// Keeps entries in memory. Used by tests and embedders that ship
/// entries themselves.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A panic elsewhere while holding the lock leaves the entries intact,
    /// so a poisoned lock is still used.
    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of everything emitted so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    /// Remove and return everything emitted so far.
    pub fn take(&self) -> Vec<LogEntry> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for MemorySink {
    fn emit(&self, entry: LogEntry) {
        self.lock().push(entry);
    }
}
