//! Liveness and readiness probes

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub pool_size: u32,
    pub idle_connections: usize,
}

/// Liveness probe; answers as long as the process runs
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness probe; numbering and gating both need the database
pub async fn ready(State(state): State<AppState>) -> Result<Json<ReadyResponse>, StatusCode> {
    if let Err(e) = sqlx::query("SELECT 1").execute(&state.pool).await {
        tracing::error!(error = ?e, "Database readiness check failed");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(Json(ReadyResponse {
        status: "ready",
        database: "connected",
        pool_size: state.pool.size(),
        idle_connections: state.pool.num_idle(),
    }))
}
