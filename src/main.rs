//! traffic-logger demo server.
//!
//! Serves a few sample routes behind the request logger so the emitted
//! entries can be inspected.
//!
//! ```text
//!   Client ─▶ request id ─▶ request logger ─▶ catch panic ─▶ timeout ─▶ routes
//!                               │
//!                               └──▶ TracingSink (stdout, pretty or JSON)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use serde_json::Value;
use tokio::net::TcpListener;

use traffic_logger::config::{load_config, AppConfig, PolicyWatcher};
use traffic_logger::lifecycle::{wait_for_signal, Shutdown};
use traffic_logger::observability::{logging, metrics};
use traffic_logger::{CorrelationKey, HandlerError, HandlerErrors, HttpServer, TracingSink};

#[derive(Parser)]
#[command(name = "traffic-logger")]
#[command(about = "Demo server instrumented with the request logger", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload the logging policy when the configuration file changes.
    #[arg(long, default_value_t = false)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init_tracing(&config.observability, &config.logging.time_format)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        log_request_body = config.logging.log_request_body,
        log_response_body = config.logging.log_response_body,
        body_size_limit = config.logging.body_size_limit,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let sink = Arc::new(TracingSink::new(config.logging.time_format.clone()));
    let server = HttpServer::new(config, demo_routes(), sink);

    // Keep the watcher alive for the lifetime of the server.
    let _watcher = match (&cli.config, cli.watch) {
        (Some(path), true) => Some(PolicyWatcher::new(path, server.policy()).run()?),
        (None, true) => {
            tracing::warn!("--watch ignored: no configuration file given");
            None
        }
        _ => None,
    };

    let shutdown = Shutdown::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn demo_routes() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/echo", post(echo))
        .route("/fail", get(fail))
        .route("/static/{*file}", get(|| async { "static asset" }))
}

async fn echo(Json(body): Json<Value>) -> impl IntoResponse {
    let at = body.get("trace").cloned().unwrap_or(Value::Null);
    (CorrelationKey(at), Json(body))
}

async fn fail() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        HandlerErrors::from(HandlerError::private("demo failure")),
        "something went wrong",
    )
}
