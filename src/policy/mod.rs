//! Logging policy subsystem.
//!
//! # Data Flow
//! ```text
//! Finished request:
//!     → exclusion.rs (should the response body be logged at all?)
//!     → payload.rs (JSON vs raw text, truncation)
//!     → severity.rs (INFO / WARN / ERROR, or suppress)
//!     → LogEntry handed to the sink
//! ```
//!
//! # Design Decisions
//! - All knobs live in one `LoggingPolicy` value passed to the logger
//! - Every function here is pure; the policy can be tested without a server

pub mod exclusion;
pub mod handle;
pub mod payload;
pub mod severity;

use serde::{Deserialize, Serialize};

pub use exclusion::{should_exclude_response_body, ExclusionSet};
pub use handle::PolicyHandle;
pub use payload::{Formatted, Payload, PayloadFormatter, NOT_LOGGED, TRUNCATION_MARKER};
pub use severity::{classify, Classification, ErrorKind, HandlerError, Severity, SuppressionRule};

/// Per-process request logging policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingPolicy {
    /// Log request bodies.
    pub log_request_body: bool,

    /// Log response bodies.
    pub log_response_body: bool,

    /// Bytes of each body retained and logged before truncation.
    pub body_size_limit: usize,

    /// Path substrings whose response bodies are never logged.
    pub excluded_paths: ExclusionSet,

    /// Exact paths that produce no entry unless a handler reported errors.
    pub suppressed_paths: SuppressionRule,

    /// chrono format string for human-readable timestamps.
    pub time_format: String,
}

impl LoggingPolicy {
    pub fn formatter(&self) -> PayloadFormatter {
        PayloadFormatter::new(self.body_size_limit)
    }

    /// Whether the response body of `path` goes into the entry.
    pub fn logs_response_body(&self, path: &str) -> bool {
        self.log_response_body && !self.excluded_paths.excludes(path)
    }
}

impl Default for LoggingPolicy {
    fn default() -> Self {
        Self {
            log_request_body: true,
            log_response_body: true,
            body_size_limit: payload::DEFAULT_BODY_SIZE_LIMIT,
            excluded_paths: ExclusionSet::default(),
            suppressed_paths: SuppressionRule::new(["/favicon.ico"]),
            time_format: "%Y-%m-%dT%H:%M:%S%z".to_string(),
        }
    }
}
