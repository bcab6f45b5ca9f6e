// HTTP proxy in front of the YouTube Data API
// Keeps the API key server-side and reshapes upstream responses

pub mod error;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::youtube::api::YouTubeClient;

#[derive(Clone)]
pub struct AppState {
    pub youtube: Arc<YouTubeClient>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/youtube/search", get(routes::search))
        .route("/api/youtube/suggestions", get(routes::suggestions))
        .route("/healthz", get(routes::healthz))
        .fallback(routes::api_not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: &Config) -> Result<()> {
    let youtube = YouTubeClient::new(
        config.api_key.clone(),
        config.api_base.clone(),
        config.suggest_url.clone(),
        config.upstream_timeout,
    )
    .context("building YouTube client")?;

    if !youtube.has_api_key() {
        warn!("YOUTUBE_API_KEY is not set; search requests will fail until it is");
    }

    let app = router(AppState {
        youtube: Arc::new(youtube),
    });

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;
    info!(%addr, "SoundWave proxy listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running proxy server")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        warn!(error = %err, "failed to install Ctrl+C handler");
    }
}
