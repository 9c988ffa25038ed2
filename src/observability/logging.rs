//! Structured logging setup.
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level
//! - Pretty output uses the configured chrono time format; JSON output is
//!   meant for log shippers

use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Install the global subscriber.
pub fn init_tracing(config: &ObservabilityConfig, time_format: &str) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().flatten_event(true))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_timer(ChronoLocal::new(time_format.to_string())))
            .try_init(),
    }
}
