//! Credential acquisition: cache first, then the interactive web flow.
//!
//! [`Authorizer::obtain`] moves through two states, unauthorized and
//! authorized, and never loops:
//!
//! 1. Load from the [`CredentialStore`]. A hit is returned untouched: no
//!    expiry check, no refresh, no network.
//! 2. On a miss (or an undecodable cache) build the authorization URL once,
//!    show it through the [`CodePrompt`], wait for the code and exchange it
//!    once.
//! 3. Save the new credential. A failed save is logged, not returned.
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use gdrelay_core::{Authorizer, FileStore, OAuthConfig, StdinPrompt};
//!
//! let store = FileStore::new("/home/me/.credentials/gdrelay-token.json");
//! let authorizer = Authorizer::new(
//!     OAuthConfig::google_drive("client-id", "client-secret"),
//!     store,
//!     StdinPrompt::new(),
//! )?;
//!
//! let credential = authorizer.obtain().await?;
//! # Ok(())
//! # }
//! ```

use crate::{
    config::OAuthConfig,
    credential::Credential,
    oauth::{AuthError, auth_code::AuthCodeFlow, prompt::CodePrompt},
    store::CredentialStore,
};

/// Obtains a credential from a cache or, failing that, from the user.
///
/// # Type Parameters
///
/// * `S` - The credential store backend
/// * `P` - How the user is asked for the authorization code
pub struct Authorizer<S: CredentialStore, P: CodePrompt> {
    flow: AuthCodeFlow,
    store: S,
    prompt: P,
}

impl<S: CredentialStore, P: CodePrompt> Authorizer<S, P> {
    /// Create an authorizer, validating the OAuth configuration.
    pub fn new(config: OAuthConfig, store: S, prompt: P) -> Result<Self, AuthError> {
        Ok(Self {
            flow: AuthCodeFlow::new(config)?,
            store,
            prompt,
        })
    }

    /// The credential store in use.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Return the cached credential, or run the web flow and cache its result.
    ///
    /// Any failure to load the cache, including an I/O error on an existing
    /// file, is logged and treated as a miss rather than returned. Missing
    /// and malformed caches log at `debug`, other errors at `warn`. A failed
    /// save is logged at `warn` and the fresh credential is still returned.
    pub async fn obtain(&self) -> Result<Credential, AuthError> {
        match self.store.load().await {
            Ok(credential) => {
                tracing::info!("Using cached credential from {}", self.store.location());
                return Ok(credential);
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!("No usable cached credential: {}", e);
            }
            Err(e) => {
                tracing::warn!("Unable to read cached credential: {}", e);
            }
        }

        let credential = self.authorize_from_web().await?;

        tracing::info!("Saving credential file to: {}", self.store.location());
        if let Err(e) = self.store.save(&credential).await {
            tracing::warn!("Unable to cache OAuth token: {}", e);
        }

        Ok(credential)
    }

    /// Run the interactive exchange without touching the cache.
    pub async fn authorize_from_web(&self) -> Result<Credential, AuthError> {
        let (auth_url, _state) = self.flow.authorization_url();
        self.prompt.present(&auth_url);

        let code = self.prompt.read_code().await?;
        self.flow.exchange_code(&code).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Prompt that must never be used.
    struct UnreachablePrompt;

    #[async_trait]
    impl CodePrompt for UnreachablePrompt {
        fn present(&self, auth_url: &str) {
            panic!("prompt shown unexpectedly: {}", auth_url);
        }

        async fn read_code(&self) -> Result<String, AuthError> {
            panic!("code requested unexpectedly");
        }
    }

    /// Prompt that records what it was shown and then gives up.
    #[derive(Default)]
    struct DecliningPrompt {
        shown: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CodePrompt for DecliningPrompt {
        fn present(&self, auth_url: &str) {
            self.shown.lock().unwrap().push(auth_url.to_string());
        }

        async fn read_code(&self) -> Result<String, AuthError> {
            Err(AuthError::CodeUnavailable {
                message: "stdin closed".to_string(),
            })
        }
    }

    fn unroutable_config() -> OAuthConfig {
        OAuthConfig::google_drive("client-id", "client-secret")
            .with_token_url("http://127.0.0.1:9/token")
    }

    #[tokio::test]
    async fn test_cached_credential_is_returned_unchanged() {
        let cached = Credential::new("cached-token")
            .with_refresh_token("refresh")
            .with_expiry(chrono::Utc::now() - chrono::Duration::days(1));
        let store = MemoryStore::with_credential(cached.clone());

        let authorizer = Authorizer::new(unroutable_config(), store, UnreachablePrompt).unwrap();
        let credential = authorizer.obtain().await.unwrap();

        assert_eq!(credential, cached);
    }

    #[tokio::test]
    async fn test_unreadable_code_fails_without_saving() {
        let authorizer =
            Authorizer::new(unroutable_config(), MemoryStore::new(), DecliningPrompt::default())
                .unwrap();

        let result = authorizer.obtain().await;
        assert!(matches!(result, Err(AuthError::CodeUnavailable { .. })));
        assert_eq!(authorizer.prompt.shown.lock().unwrap().len(), 1);
        assert!(matches!(
            authorizer.store().load().await,
            Err(StoreError::NotFound { .. })
        ));
    }

    /// Store whose reads fail with an I/O error.
    struct UnreadableStore;

    #[async_trait]
    impl CredentialStore for UnreadableStore {
        async fn load(&self) -> Result<Credential, StoreError> {
            Err(StoreError::Io {
                location: self.location(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            })
        }

        async fn save(&self, _credential: &Credential) -> Result<(), StoreError> {
            Ok(())
        }

        fn location(&self) -> String {
            "unreadable".to_string()
        }
    }

    #[tokio::test]
    async fn test_load_io_error_falls_through_to_web_flow() {
        let authorizer =
            Authorizer::new(unroutable_config(), UnreadableStore, DecliningPrompt::default())
                .unwrap();

        let result = authorizer.obtain().await;

        assert!(matches!(result, Err(AuthError::CodeUnavailable { .. })));
        assert_eq!(authorizer.prompt.shown.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = Authorizer::new(OAuthConfig::default(), MemoryStore::new(), UnreachablePrompt);
        assert!(matches!(result, Err(AuthError::InvalidConfig { .. })));
    }
}
