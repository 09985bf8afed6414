//! In-memory credential storage implementation.

use async_trait::async_trait;
use std::sync::RwLock;

use super::{CredentialStore, StoreError};
use crate::credential::Credential;

/// In-memory credential store for testing and one-shot runs.
///
/// This store is not persistent; the credential is lost when the process exits.
pub struct MemoryStore {
    slot: RwLock<Option<Credential>>,
}

impl MemoryStore {
    /// Create an empty memory store.
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// Create a memory store already holding a credential.
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: RwLock::new(Some(credential)),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let occupied = self.slot.read().map(|s| s.is_some()).unwrap_or(false);
        f.debug_struct("MemoryStore")
            .field("occupied", &occupied)
            .finish()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn load(&self) -> Result<Credential, StoreError> {
        let slot = self.slot.read().map_err(|e| StoreError::Backend {
            message: format!("lock poisoned: {}", e),
        })?;
        slot.clone().ok_or_else(|| StoreError::NotFound {
            location: self.location(),
        })
    }

    async fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        let mut slot = self.slot.write().map_err(|e| StoreError::Backend {
            message: format!("lock poisoned: {}", e),
        })?;
        *slot = Some(credential.clone());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
