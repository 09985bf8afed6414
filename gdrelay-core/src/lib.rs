//! # gdrelay core
//!
//! Download a file from a URL and upload it into Google Drive.
//!
//! This crate provides:
//! - [`Credential`] and the [`CredentialStore`] backends that cache it
//! - [`Authorizer`], the cache-or-web OAuth2 authorization-code flow
//! - [`Relay`] and [`relay()`], the fetch-then-create-file operation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gdrelay_core::{Authorizer, FileDescriptor, FileStore, OAuthConfig, StdinPrompt};
//!
//! let store = FileStore::new(FileStore::default_path("gdrelay-token.json")?);
//! let authorizer = Authorizer::new(
//!     OAuthConfig::google_drive("client-id", "client-secret"),
//!     store,
//!     StdinPrompt::new(),
//! )?;
//! let credential = authorizer.obtain().await?;
//!
//! let created = gdrelay_core::relay(
//!     "https://example.com/signed.pdf",
//!     &FileDescriptor::new("test.pdf"),
//!     &credential,
//! )
//! .await?;
//! println!("created {}", created.remote_id);
//! ```

pub mod authorizer;
pub mod config;
pub mod credential;
pub mod error;
pub mod model;
pub mod oauth;
pub mod relay;
pub mod store;

// Re-export commonly used types at crate root
pub use authorizer::Authorizer;

pub use config::OAuthConfig;

pub use credential::Credential;

pub use error::GdrelayError;

pub use model::{FileDescriptor, RelayResult};

pub use oauth::{
    AuthError,
    auth_code::AuthCodeFlow,
    prompt::{CodePrompt, StdinPrompt},
};

pub use relay::{
    DriveProvider,
    Fetcher,
    HttpFetcher,
    Relay,
    RelayError,
    SourceBody,
    StorageProvider,
    relay,
    unescape_source_url,
};

pub use store::{
    CredentialStore,
    FileStore,
    MemoryStore,
    Secret,
    StoreBackend,
    StoreError,
    create_store,
};

#[cfg(feature = "keyring-store")]
pub use store::KeyringStore;
