//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use chrono::format::{Item, StrftimeItems};
use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("logging.body_size_limit must be greater than zero")]
    ZeroBodyLimit,

    #[error("logging.excluded_paths contains an empty entry, which would exclude every path")]
    EmptyExclusion,

    #[error("logging.suppressed_paths entry {0:?} must start with '/'")]
    RelativeSuppressedPath(String),

    #[error("logging.time_format {0:?} is not a valid strftime format")]
    InvalidTimeFormat(String),
}

/// Check semantic constraints serde cannot express.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let logging = &config.logging;
    if logging.body_size_limit == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if logging.excluded_paths.entries().iter().any(|e| e.is_empty()) {
        errors.push(ValidationError::EmptyExclusion);
    }

    for path in logging.suppressed_paths.paths() {
        if !path.starts_with('/') {
            errors.push(ValidationError::RelativeSuppressedPath(path.clone()));
        }
    }

    if StrftimeItems::new(&logging.time_format).any(|item| matches!(item, Item::Error)) {
        errors.push(ValidationError::InvalidTimeFormat(logging.time_format.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
