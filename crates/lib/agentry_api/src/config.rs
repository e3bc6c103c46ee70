//! API server configuration.

use std::time::Duration;

use agentry_core::identity::userinfo::DEFAULT_TIMEOUT;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// Identity provider base URL or bare domain; `/userinfo` is appended.
    pub identity_provider_url: String,
    /// Timeout for a single `/userinfo` call.
    pub identity_provider_timeout: Duration,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                         | Default                              |
    /// |----------------------------------|--------------------------------------|
    /// | `BIND_ADDR`                      | `127.0.0.1:3100`                     |
    /// | `DATABASE_URL`                   | `postgres://localhost:5432/agentry`  |
    /// | `IDENTITY_PROVIDER_URL`          | `https://example.auth0.com`          |
    /// | `IDENTITY_PROVIDER_TIMEOUT_SECS` | `10`                                 |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3100".into()),
            pg_connection_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/agentry".into()),
            identity_provider_url: std::env::var("IDENTITY_PROVIDER_URL")
                .unwrap_or_else(|_| "https://example.auth0.com".into()),
            identity_provider_timeout: std::env::var("IDENTITY_PROVIDER_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
        }
    }
}
