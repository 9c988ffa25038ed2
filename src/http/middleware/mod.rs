//! HTTP middleware.

pub mod request_logger;

pub use request_logger::{
    request_logger_middleware, resolve_hostname, with_request_logging, RequestLogger,
    UNKNOWN_HOSTNAME,
};
