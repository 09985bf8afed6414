//! Top-level error types for gdrelay.

use thiserror::Error;

use crate::oauth::AuthError;
use crate::relay::RelayError;
use crate::store::StoreError;

/// Top-level error type encompassing all gdrelay errors.
#[derive(Debug, Error)]
pub enum GdrelayError {
    /// Error from credential storage.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Error while obtaining a credential.
    #[error("authorization error: {0}")]
    Auth(#[from] AuthError),

    /// Error while fetching or uploading.
    #[error("relay error: {0}")]
    Relay(#[from] RelayError),
}
