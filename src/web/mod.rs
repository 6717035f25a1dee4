//! HTTP interface
//!
//! Thin axum handlers over [`ViolationService`]. Query validation lives in
//! [`params`], error to status mapping in [`error`].

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    http::HeaderValue,
    routing::get,
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::cache::ViolationCache;
use crate::config::Config;
use crate::data::SocrataClient;
use crate::service::ViolationService;

pub mod error;
pub mod handlers;
pub mod params;

pub use error::ApiError;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ViolationService>,
}

/// Builds the router with CORS restricted to `allowed_origins`
pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/violations", get(handlers::list_violations))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the front-end hosts: any method and header, with credentials
///
/// Wildcards are not allowed together with credentials, so methods and
/// headers are mirrored from the preflight request instead.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) if origin != "*" => Some(value),
            _ => {
                warn!(origin = %origin, "Skipping invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Web server bound to the configured address
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    /// Wires the Socrata client, cache and service together from `config`
    pub fn new(config: &Config) -> Result<Self> {
        let source = SocrataClient::with_base_url(config.upstream_url.clone())
            .with_timeout(config.request_timeout())?
            .with_app_token(config.app_token.clone());

        let service = ViolationService::new(Arc::new(source), Arc::new(ViolationCache::new()))
            .with_ttl(config.cache_ttl())
            .with_stale_policy(config.stale_policy);

        let state = AppState {
            service: Arc::new(service),
        };

        Ok(Self {
            app: router(state, &config.allowed_origins),
            addr: config.socket_addr()?,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serves until Ctrl-C
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!("Listening on {}", listener.local_addr()?);

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
