//! Authentication middleware — runs every protected request through the
//! verification gate.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use agentry_core::models::agent::Agent;

use crate::AppState;
use crate::error::AppError;

/// Key used to store the resolved `Agent` in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedAgent(pub Agent);

/// Axum middleware: extracts `Authorization: Bearer <token>`, resolves it to
/// an agent through the gate, and injects `AuthenticatedAgent` into request
/// extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|v| v.to_str())
        .transpose()
        .map_err(|_| AppError::Unauthorized("Invalid authorization header".into()))?;

    let agent = state.gate.authenticate_header(header).await?;
    debug!(agent_id = %agent.id, path = %request.uri().path(), "request authenticated");

    request.extensions_mut().insert(AuthenticatedAgent(agent));

    Ok(next.run(request).await)
}
