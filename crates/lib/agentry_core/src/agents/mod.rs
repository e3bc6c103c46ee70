//! Agent persistence.
//!
//! The store doubles as the token cache: a presented bearer token that
//! matches an agent's stored `access_token` needs no provider round trip.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::agent::{Agent, SocialProfile};

pub use memory::MemoryAgentStore;
pub use postgres::PgAgentStore;

/// Agent store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),
}

impl StoreError {
    /// Whether the backing store could not be reached at all, as opposed to
    /// rejecting a query.
    pub fn is_unavailable(&self) -> bool {
        match self {
            StoreError::DbError(e) => matches!(
                e,
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            ),
        }
    }
}

/// Persistence for `Agent` records.
#[async_trait]
pub trait AgentStore: Send + Sync {
    /// Look up the agent currently holding `access_token`.
    async fn find_by_access_token(&self, access_token: &str) -> Result<Option<Agent>, StoreError>;

    /// Look up an agent by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Agent>, StoreError>;

    /// Record a successful provider verification.
    ///
    /// Atomically releases `access_token` from any other agent, then creates
    /// the agent for `profile.sub()` or replaces the existing agent's token and
    /// profile.
    async fn upsert_verified(
        &self,
        access_token: &str,
        profile: &SocialProfile,
    ) -> Result<Agent, StoreError>;

    /// Number of stored agents.
    async fn count(&self) -> Result<i64, StoreError>;
}
