use crate::error::AppResult;
use crate::routes::types::HealthCheckResponse;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

use super::AppState;

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let now = chrono::Utc::now();
    let entries = state.registry.count().await?;

    let response = HealthCheckResponse {
        status: "healthy".to_string(),
        entries,
        uptime_seconds: (now - state.started_at).num_seconds(),
        timestamp: now,
    };

    Ok(Json(response))
}
