//! OAuth client configuration.
//!
//! [`OAuthConfig`] carries everything the authorization-code flow needs:
//! client credentials, provider endpoints, redirect and scopes. The
//! [`OAuthConfig::google_drive`] preset targets Google's endpoints with the
//! out-of-band redirect and the `drive.file` scope.

use serde::{Deserialize, Serialize};

/// Google OAuth2 authorization endpoint.
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";

/// Google OAuth2 token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://accounts.google.com/o/oauth2/token";

/// Redirect URI that makes the provider display the code instead of redirecting.
pub const OOB_REDIRECT_URL: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Scope granting access to files created by this application.
pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

/// Configuration for an OAuth2 authorization-code client.
///
/// # Example
///
/// ```
/// use gdrelay_core::OAuthConfig;
///
/// let config = OAuthConfig::google_drive("123.apps.googleusercontent.com", "secret")
///     .with_scopes(vec!["https://www.googleapis.com/auth/drive".to_string()]);
///
/// assert_eq!(config.redirect_url, "urn:ietf:wg:oauth:2.0:oob");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OAuthConfig {
    /// OAuth client ID.
    pub client_id: String,

    /// OAuth client secret (empty for public clients).
    pub client_secret: String,

    /// Authorization endpoint URL.
    pub auth_url: String,

    /// Token endpoint URL.
    pub token_url: String,

    /// Redirect URI registered with the provider.
    pub redirect_url: String,

    /// Scopes to request.
    pub scopes: Vec<String>,
}

impl OAuthConfig {
    /// Google Drive preset with the given client credentials.
    pub fn google_drive(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            redirect_url: OOB_REDIRECT_URL.to_string(),
            scopes: vec![DRIVE_FILE_SCOPE.to_string()],
        }
    }

    /// Set the authorization URL.
    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into();
        self
    }

    /// Set the token URL.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Set the redirect URL.
    pub fn with_redirect_url(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = url.into();
        self
    }

    /// Set the requested scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// The client secret, if one is configured.
    pub fn client_secret(&self) -> Option<&str> {
        Some(self.client_secret.as_str()).filter(|s| !s.is_empty())
    }
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self::google_drive("", "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_google_drive_preset() {
        let config = OAuthConfig::google_drive("id", "secret");

        assert_eq!(config.client_id, "id");
        assert_eq!(config.client_secret(), Some("secret"));
        assert_eq!(config.auth_url, GOOGLE_AUTH_URL);
        assert_eq!(config.token_url, GOOGLE_TOKEN_URL);
        assert_eq!(config.redirect_url, OOB_REDIRECT_URL);
        assert_eq!(config.scopes, vec![DRIVE_FILE_SCOPE]);
    }

    #[test]
    fn test_builder_overrides() {
        let config = OAuthConfig::default()
            .with_auth_url("https://example.com/auth")
            .with_token_url("https://example.com/token")
            .with_redirect_url("http://localhost:8080/callback")
            .with_scopes(vec!["read".to_string()]);

        assert_eq!(config.auth_url, "https://example.com/auth");
        assert_eq!(config.token_url, "https://example.com/token");
        assert_eq!(config.redirect_url, "http://localhost:8080/callback");
        assert_eq!(config.scopes, vec!["read"]);
    }

    #[test]
    fn test_empty_secret_is_none() {
        assert_eq!(OAuthConfig::default().client_secret(), None);
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: OAuthConfig =
            serde_json::from_str(r#"{"client_id": "abc"}"#).unwrap();
        assert_eq!(config.client_id, "abc");
        assert_eq!(config.token_url, GOOGLE_TOKEN_URL);
    }
}
