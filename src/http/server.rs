//! HTTP server setup.
//!
//! # Responsibilities
//! - Wrap application routes with the request logger
//! - Wire up request ID, panic catching and handler timeout layers
//! - Serve with peer addresses available to the logger
//! - Stop when the shutdown latch fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

use crate::config::AppConfig;
use crate::http::middleware::{with_request_logging, RequestLogger};
use crate::lifecycle::Shutdown;
use crate::observability::LogSink;
use crate::policy::PolicyHandle;

/// HTTP server running application routes behind the request logger.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
    logger: Arc<RequestLogger>,
}

impl HttpServer {
    /// Create a server for `routes`, logging every request to `sink`.
    pub fn new(config: AppConfig, routes: Router, sink: Arc<dyn LogSink>) -> Self {
        let logger = Arc::new(RequestLogger::new(config.logging.clone(), sink));
        let router = Self::build_router(&config, routes, logger.clone());
        Self {
            router,
            config,
            logger,
        }
    }

    /// Layer order, outermost first: request ID, logger, panic catcher, timeout.
    /// Panics and timeouts become responses inside the logger, so they are logged too.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, routes: Router, logger: Arc<RequestLogger>) -> Router {
        let routes = routes
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(CatchPanicLayer::new());

        with_request_logging(routes, logger)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Handle for swapping the logging policy at runtime.
    pub fn policy(&self) -> PolicyHandle {
        self.logger.policy().clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the server until `shutdown` is triggered, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            hostname = %self.logger.hostname(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let signalled = shutdown.signalled();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                signalled.await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
