//! Health check handler.

use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::error::AppResult;
use crate::models::HealthResponse;

/// `GET /api/health` — service version and agent count; fails when the
/// agent store is unreachable.
pub async fn health_handler(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    let agents = state.gate.store().count().await?;
    Ok(Json(HealthResponse {
        status: "ok".into(),
        version: agentry_core::version().to_string(),
        agents,
    }))
}
