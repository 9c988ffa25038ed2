//! HTTP traffic logging middleware for axum.
//!
//! Observes every request/response pair, captures bounded copies of both
//! bodies without disturbing the handler or the client, and emits one
//! structured entry per request with a severity derived from the outcome.

pub mod capture;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod policy;

pub use config::AppConfig;
pub use http::{with_request_logging, CorrelationKey, HandlerErrors, HttpServer, RequestLogger};
pub use lifecycle::Shutdown;
pub use observability::{LogEntry, LogSink, MemorySink, TracingSink};
pub use policy::{HandlerError, LoggingPolicy, Payload, PolicyHandle, Severity};
