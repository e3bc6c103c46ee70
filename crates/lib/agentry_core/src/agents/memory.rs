//! Process-local agent store.
//!
//! Keeps agents in memory behind a single lock that guards both the token
//! and subject indexes, so an upsert is atomic with respect to lookups.
//! Used for development runs (`--memory-store`) and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::{AgentStore, StoreError};
use crate::models::agent::{Agent, SocialProfile};
use crate::uuid::uuidv7;

#[derive(Debug, Default)]
struct Inner {
    agents: HashMap<Uuid, Agent>,
    by_token: HashMap<String, Uuid>,
    by_subject: HashMap<String, Uuid>,
}

/// In-memory `AgentStore`.
#[derive(Debug, Default)]
pub struct MemoryAgentStore {
    inner: RwLock<Inner>,
}

impl MemoryAgentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All agents, oldest first.
    pub async fn agents(&self) -> Vec<Agent> {
        let inner = self.inner.read().await;
        let mut agents: Vec<Agent> = inner.agents.values().cloned().collect();
        agents.sort_by_key(|a| a.id);
        agents
    }
}

#[async_trait]
impl AgentStore for MemoryAgentStore {
    async fn find_by_access_token(&self, access_token: &str) -> Result<Option<Agent>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_token
            .get(access_token)
            .and_then(|id| inner.agents.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Agent>, StoreError> {
        Ok(self.inner.read().await.agents.get(&id).cloned())
    }

    async fn upsert_verified(
        &self,
        access_token: &str,
        profile: &SocialProfile,
    ) -> Result<Agent, StoreError> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        let now = Utc::now();

        // Release the token from whichever other agent held it.
        if let Some(holder) = inner.by_token.remove(access_token)
            && let Some(previous) = inner.agents.get_mut(&holder)
            && previous.subject != profile.sub()
        {
            previous.access_token = None;
            previous.updated_at = now;
        }

        let existing = inner
            .by_subject
            .get(profile.sub())
            .and_then(|id| inner.agents.get_mut(id));

        let agent = match existing {
            Some(agent) => {
                if let Some(old) = agent.access_token.take() {
                    inner.by_token.remove(&old);
                }
                agent.access_token = Some(access_token.to_string());
                agent.social_profile = profile.clone();
                agent.updated_at = now;
                info!(agent_id = %agent.id, subject = %profile.sub(), "agent updated");
                agent.clone()
            }
            None => {
                let agent = Agent {
                    id: uuidv7(),
                    access_token: Some(access_token.to_string()),
                    subject: profile.sub().to_string(),
                    social_profile: profile.clone(),
                    created_at: now,
                    updated_at: now,
                };
                inner.by_subject.insert(agent.subject.clone(), agent.id);
                inner.agents.insert(agent.id, agent.clone());
                info!(agent_id = %agent.id, subject = %profile.sub(), "agent created");
                agent
            }
        };

        inner.by_token.insert(access_token.to_string(), agent.id);
        Ok(agent)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.inner.read().await.agents.len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile(sub: &str, name: &str) -> SocialProfile {
        SocialProfile::from_value(json!({"sub": sub, "name": name})).expect("profile")
    }

    #[tokio::test]
    async fn first_upsert_creates_agent() {
        let store = MemoryAgentStore::new();
        let agent = store
            .upsert_verified("t1", &profile("auth0|a", "A"))
            .await
            .unwrap();

        assert_eq!(agent.access_token.as_deref(), Some("t1"));
        assert_eq!(agent.subject, "auth0|a");
        assert_eq!(store.count().await.unwrap(), 1);

        let found = store.find_by_access_token("t1").await.unwrap();
        assert_eq!(found, Some(agent.clone()));
        assert_eq!(store.find_by_id(agent.id).await.unwrap(), Some(agent));
    }

    #[tokio::test]
    async fn new_token_for_known_subject_replaces_old_token() {
        let store = MemoryAgentStore::new();
        let first = store
            .upsert_verified("t1", &profile("auth0|a", "A"))
            .await
            .unwrap();
        let second = store
            .upsert_verified("t2", &profile("auth0|a", "A renamed"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(second.access_token.as_deref(), Some("t2"));
        assert_eq!(second.social_profile.name(), Some("A renamed"));
        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.find_by_access_token("t1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn token_moves_between_subjects() {
        let store = MemoryAgentStore::new();
        let a = store
            .upsert_verified("shared", &profile("auth0|a", "A"))
            .await
            .unwrap();
        let b = store
            .upsert_verified("shared", &profile("auth0|b", "B"))
            .await
            .unwrap();

        assert_ne!(a.id, b.id);
        let holder = store.find_by_access_token("shared").await.unwrap().unwrap();
        assert_eq!(holder.id, b.id);

        let a_now = store.find_by_id(a.id).await.unwrap().unwrap();
        assert_eq!(a_now.access_token, None);
    }

    #[tokio::test]
    async fn unknown_token_misses() {
        let store = MemoryAgentStore::new();
        assert!(store.find_by_access_token("nope").await.unwrap().is_none());
        assert!(store.agents().await.is_empty());
    }
}
