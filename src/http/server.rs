//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the axum Router with the proxy handler mounted under the local
//!   proxy prefix
//! - Wire up middleware (request ID, tracing, timeout)
//! - Build the shared upstream client (no redirect following, gzip accepted)
//! - Bind the server to a listener and serve until shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::any, Router};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ConfigError, HandlerConfig, ServerConfig};
use crate::http::handler::proxy_handler;
use crate::http::request::MakeRequestUuid;
use crate::rewrite::PROXY_PREFIX;

/// Application state injected into the proxy handler.
#[derive(Clone)]
pub struct AppState {
    /// Resolved handler configuration, shared read-only by all requests.
    pub config: Arc<HandlerConfig>,

    /// Shared upstream client. Connection reuse is the transport's concern.
    pub client: reqwest::Client,

    /// Maximum inbound request body size in bytes.
    pub max_body_size: usize,
}

/// HTTP server hosting the proxy handler.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new server with the given configuration.
    ///
    /// Resolves the handler configuration (reading the environment exactly
    /// once) and builds the shared upstream client; both fail fast, before
    /// any request is accepted.
    pub fn new(config: ServerConfig) -> Result<Self, ConfigError> {
        let handler_config = Arc::new(HandlerConfig::resolve(config.handler.clone())?);

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .gzip(true)
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()?;

        tracing::info!(
            upstream = %handler_config.upstream_base_url,
            prefix = PROXY_PREFIX,
            "proxy handler configured"
        );

        let state = AppState {
            config: handler_config,
            client,
            max_body_size: config.limits.max_body_size,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router })
    }

    /// Build the axum router with all middleware layers.
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .route(PROXY_PREFIX, any(proxy_handler))
            .route("/api/.ory/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
