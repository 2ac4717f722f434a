//! Health check endpoints.
//!
//! Provides endpoints for monitoring server health and readiness.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Server status
    pub status: &'static str,
    /// Server version
    pub version: &'static str,
}

/// Liveness probe - server is running
///
/// GET /health/live
async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness probe - upload directory is usable
///
/// GET /health/ready
///
/// Re-runs the idempotent directory check, recreating the directory if it
/// disappeared since startup.
async fn readiness(State(state): State<AppState>) -> Json<ReadinessResponse> {
    let storage_ok = state.storage.ensure_dir().await.is_ok();

    Json(ReadinessResponse {
        status: if storage_ok { "ready" } else { "not_ready" },
        storage: if storage_ok { "available" } else { "unavailable" },
    })
}

/// Readiness response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub storage: &'static str,
}

/// Storage stats endpoint
///
/// GET /health/stats
async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        storage: state.storage.get_stats().await.ok(),
    })
}

/// Stats response
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub storage: Option<crate::services::storage::StorageStats>,
}

/// Create health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .route("/stats", get(stats))
}
