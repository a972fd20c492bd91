// src/api/mod.rs

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use color_eyre::eyre::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::app::AppState;

/// Builds the HTTP router over the shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .route("/", get(routes::home))
        .route("/health", get(routes::health))
        .route("/api/recon/subdomains", post(routes::enumerate_subdomains))
        .route("/api/recon/dns", post(routes::dns_lookup))
        .route("/api/tools/subdomain", post(routes::quick_subdomains))
        .layer(TraceLayer::new_for_http());

    let router = if state.config.cors_allow_any {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.with_state(state)
}

/// Binds the configured address and serves until the process is stopped.
pub async fn serve(state: Arc<AppState>) -> Result<()> {
    let addr = state.config.bind_addr();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Recon API listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
