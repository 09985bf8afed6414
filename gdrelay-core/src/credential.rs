//! OAuth2 credentials.
//!
//! A [`Credential`] is the access/refresh token pair produced by the
//! authorization flow and consumed by the relay. Its JSON form matches the
//! token cache layout used by common OAuth2 client libraries:
//!
//! ```json
//! {
//!   "access_token": "ya29...",
//!   "token_type": "Bearer",
//!   "refresh_token": "1//0g...",
//!   "expiry": "2026-10-18T12:00:00Z"
//! }
//! ```

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::store::Secret;

/// An OAuth2 access/refresh token pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// Bearer token sent with API calls.
    pub access_token: Secret,

    /// Token type (usually "Bearer").
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Refresh token, if the provider issued one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<Secret>,

    /// When the access token expires (None if unknown).
    #[serde(
        default,
        deserialize_with = "deserialize_expiry",
        skip_serializing_if = "Option::is_none"
    )]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Some writers store a missing expiry as the zero time `0001-01-01T00:00:00Z`.
fn deserialize_expiry<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let expiry: Option<DateTime<Utc>> = Option::deserialize(deserializer)?;
    Ok(expiry.filter(|t| t.year() > 1))
}

impl Credential {
    /// Create a bearer credential with only an access token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Secret::new(access_token),
            token_type: default_token_type(),
            refresh_token: None,
            expiry: None,
        }
    }

    /// Set the token type.
    pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.token_type = token_type.into();
        self
    }

    /// Attach a refresh token.
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(Secret::new(refresh_token));
        self
    }

    /// Set the expiration time.
    pub fn with_expiry(mut self, expiry: DateTime<Utc>) -> Self {
        self.expiry = Some(expiry);
        self
    }

    /// Whether this credential can authorize a request at all.
    ///
    /// Only checks for a non-empty access token; expiry is not consulted.
    pub fn is_usable(&self) -> bool {
        !self.access_token.expose().trim().is_empty()
    }

    /// Value for an `Authorization` header.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token.expose())
    }
}
