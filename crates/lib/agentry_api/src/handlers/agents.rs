//! Agent request handlers.

use axum::{Extension, Json};

use crate::middleware::auth::AuthenticatedAgent;
use crate::models::AgentResponse;

/// `GET /api/agents/me` — the agent the presented token resolved to.
pub async fn current_agent_handler(
    Extension(AuthenticatedAgent(agent)): Extension<AuthenticatedAgent>,
) -> Json<AgentResponse> {
    Json(AgentResponse::from(agent))
}
