//! OS keyring-backed credential storage implementation.

use async_trait::async_trait;
use keyring::Entry;

use super::{CredentialStore, StoreError};
use crate::credential::Credential;

/// Keyring user name the credential is stored under.
const ENTRY_USER: &str = "credential";

/// OS keyring-backed credential store.
///
/// This store uses the platform's native keyring service:
/// - macOS: Keychain
/// - Linux: kernel keyutils
/// - Windows: Credential Manager
///
/// The whole credential is kept as one JSON string in a single entry named
/// by `service_name`.
pub struct KeyringStore {
    service_name: String,
}

impl KeyringStore {
    /// Try to create a new keyring store.
    ///
    /// Returns an error if the keyring backend is not available on this platform.
    pub fn try_new(service_name: &str) -> Result<Self, StoreError> {
        match Entry::new(service_name, ENTRY_USER) {
            Ok(_) => Ok(Self {
                service_name: service_name.to_string(),
            }),
            Err(e) => Err(StoreError::KeyringUnavailable {
                message: format!("keyring backend not available: {}", e),
            }),
        }
    }

    fn entry(&self) -> Result<Entry, StoreError> {
        Entry::new(&self.service_name, ENTRY_USER).map_err(|e| StoreError::Backend {
            message: format!("failed to create keyring entry: {}", e),
        })
    }
}

impl std::fmt::Debug for KeyringStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyringStore")
            .field("service_name", &self.service_name)
            .finish()
    }
}

#[async_trait]
impl CredentialStore for KeyringStore {
    async fn load(&self) -> Result<Credential, StoreError> {
        let entry = self.entry()?;

        let json = match entry.get_password() {
            Ok(json) => json,
            Err(keyring::Error::NoEntry) => {
                return Err(StoreError::NotFound {
                    location: self.location(),
                });
            }
            Err(keyring::Error::PlatformFailure(e)) => {
                return Err(StoreError::Backend {
                    message: format!("platform keyring failure: {}", e),
                });
            }
            Err(e) => {
                return Err(StoreError::Backend {
                    message: format!("keyring error: {}", e),
                });
            }
        };

        serde_json::from_str(&json).map_err(|source| StoreError::Malformed {
            location: self.location(),
            source,
        })
    }

    async fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        let json = serde_json::to_string(credential)?;

        self.entry()?
            .set_password(&json)
            .map_err(|e| StoreError::Backend {
                message: format!("failed to set keyring password: {}", e),
            })
    }

    fn location(&self) -> String {
        format!("keyring:{}/{}", self.service_name, ENTRY_USER)
    }
}
