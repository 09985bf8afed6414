//! Credential storage.
//!
//! This module provides:
//! - [`Secret`] - A wrapper for sensitive values that prevents accidental logging
//! - [`CredentialStore`] - Trait for single-slot credential storage backends
//! - [`FileStore`] - JSON file at a caller-supplied path
//! - [`MemoryStore`] - In-memory implementation for testing
//! - [`KeyringStore`] - OS keyring implementation (with `keyring-store` feature)
//! - [`create_store`] - Helper to select a backend from configuration
//!
//! A store holds exactly one credential for the current user. There is no
//! locking: two processes saving at the same time race, and the last write
//! wins.
//!
//! # Example
//!
//! ```rust,ignore
//! use gdrelay_core::store::{CredentialStore, FileStore};
//! use gdrelay_core::Credential;
//!
//! let store = FileStore::new(FileStore::default_path("gdrelay-token.json")?);
//! store.save(&Credential::new("ya29.token")).await?;
//!
//! let loaded = store.load().await?;
//! assert_eq!(loaded.access_token.expose(), "ya29.token");
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::credential::Credential;

mod file;
mod memory;
#[cfg(feature = "keyring-store")]
mod keyring;

pub use file::FileStore;
pub use memory::MemoryStore;
#[cfg(feature = "keyring-store")]
pub use keyring::KeyringStore;

/// A secret value that prevents accidental exposure in logs.
///
/// The inner value is only accessible via [`expose()`](Secret::expose).
/// Debug and Display implementations show `[REDACTED]` instead of the value.
/// The buffer is zeroed when the secret is dropped.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Create a new secret from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret value.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Secret {}

/// Error type for credential store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No credential has been saved yet.
    #[error("no cached credential at {location}")]
    NotFound { location: String },

    /// A credential is present but cannot be decoded.
    #[error("cached credential at {location} is malformed: {source}")]
    Malformed {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    /// Reading or writing the backing file failed.
    #[error("I/O error on {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization failed while saving.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The storage backend encountered an error.
    #[error("backend error: {message}")]
    Backend { message: String },

    /// The keyring backend is not available.
    #[error("keyring not available: {message}")]
    KeyringUnavailable { message: String },
}

impl StoreError {
    /// Whether this error means "nothing usable is cached".
    ///
    /// Both a missing slot and an undecodable one send the authorization
    /// flow to the web.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. } | StoreError::Malformed { .. })
    }
}

/// Abstraction over single-credential storage backends.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the cached credential.
    ///
    /// Returns [`StoreError::NotFound`] if nothing is cached and
    /// [`StoreError::Malformed`] if the cached value cannot be decoded.
    async fn load(&self) -> Result<Credential, StoreError>;

    /// Save a credential, overwriting any previous value.
    async fn save(&self, credential: &Credential) -> Result<(), StoreError>;

    /// Human-readable description of where credentials live.
    fn location(&self) -> String;
}

#[async_trait]
impl<T: CredentialStore + ?Sized> CredentialStore for Box<T> {
    async fn load(&self) -> Result<Credential, StoreError> {
        (**self).load().await
    }

    async fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        (**self).save(credential).await
    }

    fn location(&self) -> String {
        (**self).location()
    }
}

/// Which backend [`create_store`] should build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// JSON file on disk.
    #[default]
    File,
    /// OS keyring entry.
    Keyring,
}

/// Create a credential store for the configured backend.
///
/// # Backend Selection Logic
///
/// - [`StoreBackend::File`]: a [`FileStore`] at `path`
/// - [`StoreBackend::Keyring`] with the `keyring-store` feature: a
///   [`KeyringStore`], falling back to a [`FileStore`] at `path` with a
///   warning if the keyring is unavailable
/// - [`StoreBackend::Keyring`] without the feature: a [`FileStore`] with a
///   warning
pub fn create_store(backend: StoreBackend, path: PathBuf) -> Box<dyn CredentialStore> {
    #[cfg(feature = "keyring-store")]
    if backend == StoreBackend::Keyring {
        match KeyringStore::try_new("gdrelay") {
            Ok(store) => {
                tracing::info!("Using OS keyring for credential storage");
                return Box::new(store);
            }
            Err(e) => {
                tracing::warn!(
                    "Keyring unavailable ({}), falling back to credential file {}",
                    e,
                    path.display()
                );
            }
        }
    }

    #[cfg(not(feature = "keyring-store"))]
    if backend == StoreBackend::Keyring {
        tracing::warn!(
            "Keyring storage requested but keyring-store feature not enabled. \
             Using credential file {}",
            path.display()
        );
    }

    tracing::debug!("Using credential file {}", path.display());
    Box::new(FileStore::new(path))
}
