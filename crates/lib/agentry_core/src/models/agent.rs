//! Agent domain models.
//!
//! `SocialProfile` keeps the provider's `/userinfo` object exactly as it was
//! sent; that document is what gets stored and served. Typed accessors read
//! the fields this system cares about and treat a value of the wrong shape
//! as absent. Only `sub` has to be well-formed.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while decoding a provider identity payload.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("payload is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("payload has no subject")]
    MissingSubject,
}

/// One linked account inside a social profile (e.g. `google-oauth2`, `github`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderIdentity {
    pub provider: String,
    /// Some connections (e.g. GitHub) report numeric ids; rendered as text here.
    pub user_id: Option<String>,
    pub connection: Option<String>,
    pub is_social: Option<bool>,
}

/// Identity payload returned by the provider's `/userinfo` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct SocialProfile {
    raw: Map<String, Value>,
}

impl SocialProfile {
    /// Decode and validate a raw `/userinfo` body.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ProfileError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }

    /// Validate an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, ProfileError> {
        let Value::Object(raw) = value else {
            return Err(ProfileError::NotAnObject);
        };
        match raw.get("sub").and_then(Value::as_str) {
            Some(sub) if !sub.trim().is_empty() => Ok(Self { raw }),
            _ => Err(ProfileError::MissingSubject),
        }
    }

    /// The payload as the provider sent it.
    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    /// Any member of the payload, typed or not.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    /// Provider subject; the stable identity key for upserts.
    pub fn sub(&self) -> &str {
        self.str_field("sub").unwrap_or_default()
    }

    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    pub fn nickname(&self) -> Option<&str> {
        self.str_field("nickname")
    }

    pub fn email(&self) -> Option<&str> {
        self.str_field("email")
    }

    pub fn locale(&self) -> Option<&str> {
        self.str_field("locale")
    }

    pub fn picture(&self) -> Option<&str> {
        self.str_field("picture")
    }

    /// Enterprise connections sometimes send `"true"`/`"false"` strings.
    pub fn email_verified(&self) -> Option<bool> {
        match self.raw.get("email_verified")? {
            Value::Bool(b) => Some(*b),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }

    /// Role labels; non-string entries are skipped.
    pub fn roles(&self) -> Vec<&str> {
        self.array_field("roles")
            .filter_map(Value::as_str)
            .collect()
    }

    /// Linked accounts; entries without a `provider` are skipped.
    pub fn identities(&self) -> Vec<ProviderIdentity> {
        self.array_field("identities")
            .filter_map(Value::as_object)
            .filter_map(|entry| {
                let provider = entry.get("provider")?.as_str()?.to_string();
                let user_id = match entry.get("user_id") {
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(Value::Number(n)) => Some(n.to_string()),
                    _ => None,
                };
                Some(ProviderIdentity {
                    provider,
                    user_id,
                    connection: entry
                        .get("connection")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    is_social: entry.get("isSocial").and_then(Value::as_bool),
                })
            })
            .collect()
    }

    /// Case-insensitive role membership test.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles().iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.raw.get(key).and_then(Value::as_str)
    }

    fn array_field(&self, key: &str) -> impl Iterator<Item = &Value> {
        self.raw
            .get(key)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
    }
}

impl TryFrom<Value> for SocialProfile {
    type Error = ProfileError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<SocialProfile> for Value {
    fn from(profile: SocialProfile) -> Self {
        Value::Object(profile.raw)
    }
}

/// An authenticated principal.
#[derive(Clone, PartialEq)]
pub struct Agent {
    pub id: Uuid,
    /// Most recently verified bearer token; `None` once another agent took it over.
    pub access_token: Option<String>,
    /// Provider subject (`SocialProfile::sub`).
    pub subject: String,
    pub social_profile: SocialProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Agent {
    pub fn has_role(&self, role: &str) -> bool {
        self.social_profile.has_role(role)
    }
}

// Tokens stay out of logs.
impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("subject", &self.subject)
            .field("social_profile", &self.social_profile)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}
