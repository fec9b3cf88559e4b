//! HTTP server for billionsd

use crate::config::Config;
use crate::routes;
use anyhow::{Context, Result};
use axum::Router;
use billions_common::UserStore;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub config: Config,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn UserStore>, config: Config) -> Self {
        Self {
            store,
            config,
            start_time: Instant::now(),
        }
    }
}

/// Build the full router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::auth_routes())
        .merge(routes::user_routes())
        .merge(routes::game_routes())
        .merge(routes::verification_routes())
        .merge(routes::referral_routes())
        .merge(routes::leaderboard_routes())
        .merge(routes::community_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until Ctrl-C
pub async fn run(state: AppState) -> Result<()> {
    let addr = state.config.server.bind_addr.clone();
    let app = router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("  Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
    }
}
