//! Status code to log severity.
//!
//! # Transitions
//! ```text
//! handler errors present              → ERROR, message = private error descriptions
//! no errors, path in suppression list → Suppress (no entry)
//! no errors, status >= 500            → ERROR
//! no errors, 400 <= status < 500      → WARN
//! no errors, status < 400             → INFO
//! ```
//!
//! Suppression never applies when handler errors are present.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// Log level of a single request entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visibility of a handler-reported error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Internal detail, surfaced only in logs.
    Private,
    /// Meant for the client; does not appear in the log message.
    Public,
}

/// An error a handler attached to its response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerError {
    pub kind: ErrorKind,
    pub message: String,
}

impl HandlerError {
    pub fn private(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Private,
            message: message.into(),
        }
    }

    pub fn public(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Public,
            message: message.into(),
        }
    }
}

/// Render private errors as `Error #01: ...` lines.
pub fn private_error_message(errors: &[HandlerError]) -> String {
    errors
        .iter()
        .filter(|e| e.kind == ErrorKind::Private)
        .enumerate()
        .map(|(i, e)| format!("Error #{:02}: {}", i + 1, e.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Exact paths whose entries are dropped when the request succeeded
/// without handler errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuppressionRule {
    paths: Vec<String>,
}

impl SuppressionRule {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }
}

/// Outcome of classifying one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Emit { severity: Severity, message: String },
    Suppress,
}

/// Severity for a status code alone.
pub fn severity_for_status(status: StatusCode) -> Severity {
    if status.as_u16() >= 500 {
        Severity::Error
    } else if status.as_u16() >= 400 {
        Severity::Warn
    } else {
        Severity::Info
    }
}

/// Decide whether and how to log a finished request.
pub fn classify(
    status: StatusCode,
    errors: &[HandlerError],
    path: &str,
    suppression: &SuppressionRule,
) -> Classification {
    if !errors.is_empty() {
        return Classification::Emit {
            severity: Severity::Error,
            message: private_error_message(errors),
        };
    }

    if suppression.matches(path) {
        return Classification::Suppress;
    }

    Classification::Emit {
        severity: severity_for_status(status),
        message: String::new(),
    }
}
