//! OAuth 2.0 authorization-code flow.
//!
//! - [`auth_code`] - Authorization URL construction and code exchange
//! - [`prompt`] - Presenting the URL and reading back the pasted code

pub mod auth_code;
pub mod prompt;

use oauth2::{AuthUrl, ClientId, ClientSecret, RedirectUrl, TokenUrl, basic::BasicClient};
use thiserror::Error;

use crate::config::OAuthConfig;

/// Error type for authorization.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The OAuth configuration is missing or invalid.
    #[error("invalid OAuth configuration: {message}")]
    InvalidConfig { message: String },

    /// The authorization code could not be read from the user.
    #[error("unable to read authorization code: {message}")]
    CodeUnavailable { message: String },

    /// The token endpoint rejected the code or could not be reached.
    #[error("unable to retrieve token from web: {message}")]
    Exchange { message: String },
}

/// Create an OAuth2 client from a configuration.
///
/// Fails with [`AuthError::InvalidConfig`] if the client ID is empty or any
/// endpoint is not a valid URL.
pub fn create_oauth_client(config: &OAuthConfig) -> Result<BasicClient, AuthError> {
    if config.client_id.trim().is_empty() {
        return Err(AuthError::InvalidConfig {
            message: "client ID is empty".to_string(),
        });
    }

    let auth_url = AuthUrl::new(config.auth_url.clone()).map_err(|e| AuthError::InvalidConfig {
        message: format!("invalid auth URL: {}", e),
    })?;

    let token_url =
        TokenUrl::new(config.token_url.clone()).map_err(|e| AuthError::InvalidConfig {
            message: format!("invalid token URL: {}", e),
        })?;

    let redirect_url =
        RedirectUrl::new(config.redirect_url.clone()).map_err(|e| AuthError::InvalidConfig {
            message: format!("invalid redirect URL: {}", e),
        })?;

    let client = BasicClient::new(
        ClientId::new(config.client_id.clone()),
        config.client_secret().map(|s| ClientSecret::new(s.to_string())),
        auth_url,
        Some(token_url),
    )
    .set_redirect_uri(redirect_url);

    Ok(client)
}
