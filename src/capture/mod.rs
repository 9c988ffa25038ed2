//! Body capture subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request body (read-once)
//!     → tee.rs (buffer a bounded copy, rebuild a replay body)
//!     → downstream handler reads the replay body
//!
//! Outbound response body
//!     → body.rs (CaptureBody forwards every frame, keeps a capped copy)
//!     → client receives the unmodified stream
//!     → ResponseSnapshot handed to the logger when the stream ends
//! ```
//!
//! # Design Decisions
//! - Capture never changes what the handler reads or what the client receives
//! - Retained copies are bounded by the configured body size limit
//! - Streaming responses stay streaming; nothing is collected up front

pub mod body;
pub mod tee;

pub use body::{CaptureBody, OnFinish, ResponseCapture, ResponseSnapshot, StreamEnd};
pub use tee::{tee_body, tee_body_into, tee_request, CapturedRequestBody, TeeOutcome, TeedBody};
