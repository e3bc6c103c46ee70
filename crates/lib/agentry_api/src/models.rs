//! API request/response models.
//!
//! Wire shapes use camelCase; the social profile keeps the provider's own
//! field names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use agentry_core::models::agent::{Agent, SocialProfile};

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// `GET /api/health` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub agents: i64,
}

/// An agent as exposed over HTTP. The access token is never returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    pub id: Uuid,
    pub subject: String,
    pub social_profile: SocialProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Agent> for AgentResponse {
    fn from(agent: Agent) -> Self {
        Self {
            id: agent.id,
            subject: agent.subject,
            social_profile: agent.social_profile,
            created_at: agent.created_at,
            updated_at: agent.updated_at,
        }
    }
}
