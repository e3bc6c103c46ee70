//! Identity provider access.
//!
//! The gate only needs one question answered: "who does this bearer token
//! belong to?". `IdentityProvider` is that seam; `UserInfoClient` answers it
//! over HTTP with the provider's `/userinfo` endpoint.

pub mod userinfo;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::agent::{ProfileError, SocialProfile};

pub use userinfo::UserInfoClient;

/// Identity provider errors. All of them fail authentication.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Identity provider rejected the token (HTTP {status})")]
    Rejected { status: u16 },

    #[error("Identity provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Identity provider unreachable: {0}")]
    Unreachable(String),

    #[error("Invalid identity payload: {0}")]
    InvalidPayload(#[from] ProfileError),

    #[error("Invalid identity provider configuration: {0}")]
    Config(String),
}

/// Resolves a bearer token to the identity that owns it.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn user_info(&self, access_token: &str) -> Result<SocialProfile, ProviderError>;
}
