//! PostgreSQL agent store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::info;
use uuid::Uuid;

use super::{AgentStore, StoreError};
use crate::models::agent::{Agent, SocialProfile};
use crate::uuid::uuidv7;

/// (id, access_token, subject, social_profile, created_at, updated_at)
type AgentRow = (
    Uuid,
    Option<String>,
    String,
    Json<SocialProfile>,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn agent_from_row(row: AgentRow) -> Agent {
    let (id, access_token, subject, Json(social_profile), created_at, updated_at) = row;
    Agent {
        id,
        access_token,
        subject,
        social_profile,
        created_at,
        updated_at,
    }
}

/// `AgentStore` backed by the `agents` table.
#[derive(Debug, Clone)]
pub struct PgAgentStore {
    pool: PgPool,
}

impl PgAgentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AgentStore for PgAgentStore {
    async fn find_by_access_token(&self, access_token: &str) -> Result<Option<Agent>, StoreError> {
        let row = sqlx::query_as::<_, AgentRow>(
            "SELECT id, access_token, subject, social_profile, created_at, updated_at \
             FROM agents WHERE access_token = $1",
        )
        .bind(access_token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(agent_from_row))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Agent>, StoreError> {
        let row = sqlx::query_as::<_, AgentRow>(
            "SELECT id, access_token, subject, social_profile, created_at, updated_at \
             FROM agents WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(agent_from_row))
    }

    async fn upsert_verified(
        &self,
        access_token: &str,
        profile: &SocialProfile,
    ) -> Result<Agent, StoreError> {
        let mut tx = self.pool.begin().await?;

        // The token is a cache key; only one agent may hold it.
        sqlx::query(
            "UPDATE agents SET access_token = NULL, updated_at = now() \
             WHERE access_token = $1 AND subject <> $2",
        )
        .bind(access_token)
        .bind(profile.sub())
        .execute(&mut *tx)
        .await?;

        // `xmax = 0` only holds for freshly inserted tuples.
        let (id, token, subject, Json(social_profile), created_at, updated_at, inserted) =
            sqlx::query_as::<
                _,
                (
                    Uuid,
                    Option<String>,
                    String,
                    Json<SocialProfile>,
                    DateTime<Utc>,
                    DateTime<Utc>,
                    bool,
                ),
            >(
                "INSERT INTO agents (id, access_token, subject, social_profile) \
                 VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (subject) DO UPDATE \
                 SET access_token = EXCLUDED.access_token, \
                     social_profile = EXCLUDED.social_profile, \
                     updated_at = now() \
                 RETURNING id, access_token, subject, social_profile, created_at, updated_at, \
                           (xmax = 0) AS inserted",
            )
            .bind(uuidv7())
            .bind(access_token)
            .bind(profile.sub())
            .bind(Json(profile))
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        if inserted {
            info!(agent_id = %id, subject = %subject, "agent created");
        } else {
            info!(agent_id = %id, subject = %subject, "agent updated");
        }

        Ok(Agent {
            id,
            access_token: token,
            subject,
            social_profile,
            created_at,
            updated_at,
        })
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM agents")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
