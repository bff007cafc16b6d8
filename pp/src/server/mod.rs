//! HTTP surface: the progress authority, both peers and the operator endpoints
//! on one listener.

mod error;
mod handlers;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use eyre::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::broadcast::{self, error::RecvError};
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::config::{Config, RelayConfig};
use crate::progress::{ProgressEvent, ProgressStore};
use crate::relay::{HttpAuthority, HttpPeer, Peer, ProgressAuthority, RelayCoordinator, RelayError};

pub use error::ApiError;
pub use handlers::{ConfigureRequest, ConfigureResponse, StatusQuery};

/// Shared state for the handlers
#[derive(Clone)]
pub struct AppState {
    pub store: ProgressStore,
    pub ping: Arc<RelayCoordinator>,
    pub pong: Arc<RelayCoordinator>,
}

impl AppState {
    pub fn new(store: ProgressStore, ping: RelayCoordinator, pong: RelayCoordinator) -> Self {
        Self {
            store,
            ping: Arc::new(ping),
            pong: Arc::new(pong),
        }
    }

    /// Wire both peers to forward over HTTP, reporting locally or remotely
    pub fn from_config(store: ProgressStore, relay: &RelayConfig) -> Result<Self, RelayError> {
        debug!(?relay, "AppState::from_config: called");
        let link = Arc::new(HttpPeer::new(&relay.base_url, relay.forward_timeout())?);
        let authority: Arc<dyn ProgressAuthority> = if relay.remote_authority {
            Arc::new(HttpAuthority::new(&relay.base_url, relay.report_timeout())?)
        } else {
            Arc::new(store.clone())
        };

        let coordinator = |peer| {
            RelayCoordinator::new(peer, authority.clone(), link.clone())
                .with_timeouts(relay.report_timeout(), relay.forward_timeout())
        };
        Ok(Self::new(store, coordinator(Peer::Ping), coordinator(Peer::Pong)))
    }
}

/// Largest accepted request body; a 2,000,000-cell batch is ~80 MB of JSON
pub const MAX_BODY_BYTES: usize = 256 * 1024 * 1024;

/// Create the router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/configure/", post(handlers::configure))
        .route("/api/generate/", post(handlers::generate))
        .route("/api/status/", get(handlers::status))
        .route("/api/status/update_pixel/", post(handlers::update_pixel))
        .route("/api/ui/", get(handlers::image))
        .route("/api/validate/", get(handlers::validate))
        .route("/api/ping/", post(handlers::ping))
        .route("/api/pong/", post(handlers::pong))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
}

/// Run the service until ctrl-c
pub async fn serve(config: &Config) -> Result<()> {
    debug!(bind = %config.server.bind, "serve: called");
    let store = ProgressStore::spawn();
    let state = AppState::from_config(store.clone(), &config.relay).context("Failed to set up relay")?;

    tokio::spawn(log_events(store.subscribe_events()));

    let listener = TcpListener::bind(config.server.bind)
        .await
        .context(format!("Failed to bind {}", config.server.bind))?;
    info!("Listening on http://{}", config.server.bind);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    store.shutdown().await.ok();
    info!("Server stopped");
    Ok(())
}

async fn log_events(mut events: broadcast::Receiver<ProgressEvent>) {
    loop {
        match events.recv().await {
            Ok(ProgressEvent::Configured { run_id, m, n }) => info!(%run_id, m, n, "Run configured"),
            Ok(ProgressEvent::Completed { run_id, total_pixels }) => info!(%run_id, total_pixels, "Run completed"),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event log lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}
