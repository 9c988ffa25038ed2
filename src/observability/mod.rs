//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request logger produces:
//!     → entry.rs (one LogEntry per request)
//!     → sink.rs (LogSink: tracing events, or in-memory for tests)
//!     → metrics.rs (counters, latency histogram)
//!
//! Process startup:
//!     → logging.rs (tracing subscriber, pretty or JSON)
//! ```
//!
//! # Design Decisions
//! - The sink is injected; the logger never chooses a transport
//! - Metrics are cheap and optional (no recorder means no-op)

pub mod entry;
pub mod logging;
pub mod metrics;
pub mod sink;

pub use entry::LogEntry;
pub use sink::{LogSink, MemorySink, TracingSink, ACCESS_LOG_TARGET};
