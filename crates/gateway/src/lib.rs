//! HTTP API gateway for Vantage.
//!
//! Exposes the orchestrator as `POST /v1/chat` plus a `GET /health` probe,
//! and performs the caller-side duties after each reply (memory append,
//! archival) in the background.
//!
//! Built on Axum.

pub mod api_v1;
pub mod persist;

#[cfg(test)]
pub(crate) mod test_support;

use axum::extract::DefaultBodyLimit;
use axum::{Router, response::Json, routing::get};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use vantage_agent::Orchestrator;
use vantage_core::archive::ArchiveSink;
use vantage_core::event::EventBus;

pub use persist::{persist_exchange, spawn_persist};

/// Request bodies larger than this are rejected before parsing.
const BODY_LIMIT_BYTES: usize = 64 * 1024;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub orchestrator: Arc<Orchestrator>,
    pub archive: Arc<dyn ArchiveSink>,
}

/// Build the full router: `/health` plus the v1 API under `/v1`.
pub fn build_router(state: api_v1::SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .nest("/v1", api_v1::v1_router(state))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Assemble the pipeline from `config` and serve until Ctrl-C.
pub async fn start(config: vantage_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    if !config.has_api_key() {
        warn!("No completion API key configured; every reply will be the degraded response");
    }

    let completion = vantage_providers::build_from_config(&config);
    let event_bus = Arc::new(EventBus::default());
    let orchestrator = Arc::new(vantage_agent::build_from_config(
        &config,
        completion,
        event_bus,
    ));
    let archive = vantage_memory::build_archive(&config.archive);

    let state = Arc::new(GatewayState {
        orchestrator,
        archive,
    });
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

// --- Handlers ---

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}
