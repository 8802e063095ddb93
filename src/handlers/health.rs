use axum::{extract::State, http::StatusCode, response::Json};
use tracing::{error, instrument};

use crate::schemas::{AppState, HealthResponse};

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 500, description = "Database is unreachable", body = HealthResponse)
    )
)]
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, health, database) = match state.db.ping().await {
        Ok(_) => (StatusCode::OK, "healthy", "connected"),
        Err(e) => {
            error!("Database ping failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "unhealthy", "disconnected")
        }
    };

    let response = HealthResponse {
        status: health.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
    };

    (status, Json(response))
}
