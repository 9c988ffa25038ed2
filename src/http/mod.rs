//! HTTP integration subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, panic catching)
//!     → middleware/request_logger.rs (snapshot, tee, capture, emit)
//!     → request.rs (client IP, referer, correlation key)
//!     → wrapped application routes
//!     → response.rs (handler errors / correlation key read back)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use middleware::{with_request_logging, RequestLogger};
pub use request::{RequestSnapshot, X_REQUEST_ID};
pub use response::{CorrelationKey, HandlerErrors};
pub use server::HttpServer;
