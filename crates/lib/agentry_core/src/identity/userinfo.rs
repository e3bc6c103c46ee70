//! HTTP client for the provider's `/userinfo` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::ACCEPT};
use tracing::{debug, warn};
use url::Url;

use super::{IdentityProvider, ProviderError};
use crate::models::agent::SocialProfile;

/// Default request timeout for `/userinfo` calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest provider error body kept in `ProviderError::Status`.
const MAX_ERROR_BODY: usize = 512;

/// `IdentityProvider` that forwards the bearer token to `{base_url}/userinfo`.
#[derive(Debug, Clone)]
pub struct UserInfoClient {
    client: Client,
    endpoint: Url,
}

impl UserInfoClient {
    /// Build a client with its own connection pool and request timeout.
    ///
    /// `base_url` may be a bare provider domain (`tenant.auth0.com`), in which
    /// case `https://` is assumed.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Config(format!("http client: {e}")))?;
        Self::with_client(client, base_url)
    }

    /// Build a client on top of an existing `reqwest::Client`.
    pub fn with_client(client: Client, base_url: &str) -> Result<Self, ProviderError> {
        let endpoint = userinfo_url(base_url)?;
        Ok(Self { client, endpoint })
    }

    /// The resolved `/userinfo` URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl IdentityProvider for UserInfoClient {
    async fn user_info(&self, access_token: &str) -> Result<SocialProfile, ProviderError> {
        debug!(endpoint = %self.endpoint, "fetching userinfo");

        let resp = self
            .client
            .get(self.endpoint.clone())
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ProviderError::Unreachable(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(status = status.as_u16(), "identity provider rejected token");
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let mut body = resp.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            warn!(status = status.as_u16(), "identity provider error");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ProviderError::Unreachable(format!("reading userinfo body: {e}")))?;
        Ok(SocialProfile::from_json(&bytes)?)
    }
}

/// Resolve `{base_url}/userinfo`, keeping any path prefix on the base.
fn userinfo_url(base_url: &str) -> Result<Url, ProviderError> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(ProviderError::Config("empty identity provider URL".into()));
    }
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let mut base = Url::parse(&with_scheme)
        .map_err(|e| ProviderError::Config(format!("{with_scheme}: {e}")))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("userinfo")
        .map_err(|e| ProviderError::Config(format!("{with_scheme}: {e}")))
}
