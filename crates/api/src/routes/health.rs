//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::app::AppState;

/// Liveness response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
}

/// Readiness response with database connectivity.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ReadinessResponse {
    pub status: String,
    pub database: DatabaseHealth,
}

/// Database health status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseHealth {
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// GET /api/v1/health
///
/// Liveness probe. Answers without touching any dependency.
pub async fn health_check() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/v1/health/ready
///
/// Readiness probe. Runs `SELECT 1` against the pool and reports latency;
/// returns 503 while the database is unreachable.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, StatusCode> {
    let start = std::time::Instant::now();
    let connected = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();
    let latency_ms = start.elapsed().as_millis() as u64;

    if !connected {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(Json(ReadinessResponse {
        status: "ready".to_string(),
        database: DatabaseHealth {
            connected,
            latency_ms: Some(latency_ms),
        },
    }))
}
