//! Authorization Code flow with a manual (out-of-band) redirect.
//!
//! # Flow Overview
//!
//! 1. Build the authorization URL with `access_type=offline`
//! 2. The user opens it, approves, and is shown a code
//! 3. The user pastes the code back
//! 4. Exchange the code for a [`Credential`] at the token endpoint
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use gdrelay_core::OAuthConfig;
//! use gdrelay_core::oauth::auth_code::AuthCodeFlow;
//!
//! let flow = AuthCodeFlow::new(OAuthConfig::google_drive("client-id", "client-secret"))?;
//!
//! let (auth_url, _state) = flow.authorization_url();
//! println!("Visit: {}", auth_url);
//!
//! // After the user pastes the code...
//! let credential = flow.exchange_code("authorization-code").await?;
//! # Ok(())
//! # }
//! ```

use oauth2::{
    AuthorizationCode, CsrfToken, Scope, TokenResponse,
    basic::{BasicClient, BasicTokenType},
    reqwest::async_http_client,
};

use super::{AuthError, create_oauth_client};
use crate::config::OAuthConfig;
use crate::credential::Credential;

/// Authorization-code flow for a single OAuth client.
pub struct AuthCodeFlow {
    config: OAuthConfig,
    client: BasicClient,
}

impl AuthCodeFlow {
    /// Create a flow, validating the configuration up front.
    pub fn new(config: OAuthConfig) -> Result<Self, AuthError> {
        let client = create_oauth_client(&config)?;
        Ok(Self { config, client })
    }

    /// The configuration this flow was built from.
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Build the authorization URL for the user to visit.
    ///
    /// Returns the URL and the CSRF state embedded in it. With the
    /// out-of-band redirect the state never comes back, so callers are free
    /// to ignore it.
    pub fn authorization_url(&self) -> (String, String) {
        let mut request = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_extra_param("access_type", "offline");

        for scope in &self.config.scopes {
            request = request.add_scope(Scope::new(scope.clone()));
        }

        let (url, state) = request.url();
        (url.to_string(), state.secret().to_string())
    }

    /// Exchange an authorization code for a credential.
    ///
    /// Makes exactly one request to the token endpoint.
    pub async fn exchange_code(&self, code: &str) -> Result<Credential, AuthError> {
        tracing::debug!("Exchanging authorization code at {}", self.config.token_url);

        let response = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| AuthError::Exchange {
                message: e.to_string(),
            })?;

        let token_type = match response.token_type() {
            BasicTokenType::Bearer => "Bearer".to_string(),
            BasicTokenType::Mac => "MAC".to_string(),
            BasicTokenType::Extension(other) => other.clone(),
        };

        let mut credential = Credential::new(response.access_token().secret().as_str())
            .with_token_type(token_type);

        if let Some(refresh_token) = response.refresh_token() {
            credential = credential.with_refresh_token(refresh_token.secret().as_str());
        }

        if let Some(expires_in) = response.expires_in() {
            let expires_in =
                chrono::Duration::from_std(expires_in).map_err(|e| AuthError::Exchange {
                    message: format!("invalid expiration duration: {}", e),
                })?;
            credential = credential.with_expiry(chrono::Utc::now() + expires_in);
        }

        Ok(credential)
    }
}
