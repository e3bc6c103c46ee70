//! Verification gate — resolves a bearer token to an `Agent`.
//!
//! A token already stored on an agent is trusted as-is. Unseen tokens are
//! sent to the identity provider exactly once; on success the returned
//! profile is upserted and the agent handed back. Provider failures never
//! touch the store.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::agents::{AgentStore, StoreError};
use crate::identity::{IdentityProvider, ProviderError};
use crate::models::agent::Agent;

/// Gate errors.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("Missing authorization header")]
    MissingCredentials,

    #[error("Invalid authorization header: {0}")]
    MalformedCredentials(&'static str),

    #[error("Authentication failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Agent store error: {0}")]
    Store(#[from] StoreError),
}

impl GateError {
    /// Bad or unverifiable credentials, as opposed to an internal failure.
    pub fn is_authentication_failure(&self) -> bool {
        !matches!(self, GateError::Store(_))
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, GateError> {
    let header = header.ok_or(GateError::MissingCredentials)?.trim();
    let (scheme, token) = header
        .split_once(char::is_whitespace)
        .ok_or(GateError::MalformedCredentials("expected `Bearer <token>`"))?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(GateError::MalformedCredentials("invalid authorization scheme"));
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(GateError::MalformedCredentials("empty bearer token"));
    }
    Ok(token)
}

/// Sits in front of every protected request.
#[derive(Clone)]
pub struct VerificationGate {
    store: Arc<dyn AgentStore>,
    provider: Arc<dyn IdentityProvider>,
}

impl VerificationGate {
    pub fn new(store: Arc<dyn AgentStore>, provider: Arc<dyn IdentityProvider>) -> Self {
        Self { store, provider }
    }

    pub fn store(&self) -> &Arc<dyn AgentStore> {
        &self.store
    }

    /// Authenticate a raw `Authorization` header value.
    pub async fn authenticate_header(&self, header: Option<&str>) -> Result<Agent, GateError> {
        let token = extract_bearer(header)?;
        self.authenticate(token).await
    }

    /// Resolve `token` to an agent, consulting the provider only on a miss.
    pub async fn authenticate(&self, token: &str) -> Result<Agent, GateError> {
        if token.is_empty() {
            return Err(GateError::MalformedCredentials("empty bearer token"));
        }

        if let Some(agent) = self.store.find_by_access_token(token).await.map_err(|e| {
            error!(error = %e, "agent lookup failed");
            GateError::Store(e)
        })? {
            debug!(agent_id = %agent.id, "token cache hit");
            return Ok(agent);
        }

        debug!("token cache miss, asking identity provider");
        let profile = self.provider.user_info(token).await.map_err(|e| {
            warn!(error = %e, "identity verification failed");
            GateError::Provider(e)
        })?;

        let agent = self
            .store
            .upsert_verified(token, &profile)
            .await
            .map_err(|e| {
                error!(error = %e, subject = %profile.sub(), "agent upsert failed");
                GateError::Store(e)
            })?;
        Ok(agent)
    }
}
