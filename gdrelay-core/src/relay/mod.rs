//! Fetch-and-relay: download a URL and stream it into a new remote file.
//!
//! This module provides:
//! - [`Fetcher`] / [`HttpFetcher`] - Opening the source as a byte stream
//! - [`StorageProvider`] / [`DriveProvider`] - The "create file" call
//! - [`Relay`] - One fetch followed by one upload, never retried
//! - [`relay`] - The whole operation against plain HTTP and Google Drive
//!
//! The source body is owned by a [`SourceBody`] that moves from the fetcher
//! into the provider. Whatever happens, the provider drops it before
//! returning, so the underlying response is released exactly once.
//!
//! If the source breaks while the provider is reading it, the relay reports
//! [`RelayError::Fetch`] rather than whatever the provider made of the
//! aborted upload.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::credential::Credential;
use crate::model::{FileDescriptor, RelayResult};

mod drive;
mod fetch;

pub use drive::{DRIVE_UPLOAD_BASE, DriveProvider};
pub use fetch::{HttpFetcher, unescape_source_url};

/// Error type for relay operations.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The credential has no access token.
    #[error("credential has an empty access token")]
    InvalidCredential,

    /// The source URL could not be parsed or decoded.
    #[error("invalid source URL {url}: {message}")]
    InvalidSource { url: String, message: String },

    /// Fetching the source failed (transport error or non-success status).
    #[error("fetch of {url} failed: {message}")]
    Fetch { url: String, message: String },

    /// The provider rejected the create-file call.
    #[error("upload rejected with status {status}: {body}")]
    Upload { status: u16, body: String },

    /// The provider could not be reached or answered with something unusable.
    #[error("storage provider error: {message}")]
    Provider { message: String },
}

/// A boxed stream of body chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// The open body of a fetched source.
///
/// Dropping it closes the underlying response.
pub struct SourceBody {
    stream: ByteStream,
    content_type: Option<String>,
    content_length: Option<u64>,
}

impl SourceBody {
    /// Wrap a chunk stream.
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static,
    {
        Self {
            stream: Box::pin(stream),
            content_type: None,
            content_length: None,
        }
    }

    /// Record the `Content-Type` the source reported.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Record the `Content-Length` the source reported.
    pub fn with_content_length(mut self, content_length: u64) -> Self {
        self.content_length = Some(content_length);
        self
    }

    /// The `Content-Type` the source reported, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// The `Content-Length` the source reported, if any.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Take the chunk stream, consuming the body.
    pub fn into_stream(self) -> ByteStream {
        self.stream
    }

    /// Record the first error the chunk stream yields into `failure`.
    fn record_failure(mut self, failure: SourceFailure) -> Self {
        self.stream = Box::pin(self.stream.inspect_err(move |e| failure.record(e)));
        self
    }
}

/// First error seen on a source stream after it left the fetcher.
#[derive(Debug, Clone, Default)]
struct SourceFailure(Arc<Mutex<Option<String>>>);

impl SourceFailure {
    fn record(&self, error: &std::io::Error) {
        if let Ok(mut slot) = self.0.lock() {
            slot.get_or_insert_with(|| error.to_string());
        }
    }

    fn take(&self) -> Option<String> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl std::fmt::Debug for SourceBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceBody")
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Opens a source URL for reading.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Issue one request for `url` and return its body.
    async fn fetch(&self, url: &str) -> Result<SourceBody, RelayError>;
}

/// A remote storage service that can create files from a byte stream.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Create a file described by `dest` with `body` as its content.
    ///
    /// Implementations make a single attempt and must consume or drop
    /// `body` before returning. An error read from `body` may be reported
    /// as any variant; [`Relay`] turns it into [`RelayError::Fetch`].
    async fn create_file(
        &self,
        credential: &Credential,
        dest: &FileDescriptor,
        body: SourceBody,
    ) -> Result<RelayResult, RelayError>;
}

/// Links a [`Fetcher`] to a [`StorageProvider`].
pub struct Relay<F: Fetcher, P: StorageProvider> {
    fetcher: F,
    provider: P,
}

impl<F: Fetcher, P: StorageProvider> Relay<F, P> {
    /// Create a relay from its two halves.
    pub fn new(fetcher: F, provider: P) -> Self {
        Self { fetcher, provider }
    }

    /// Fetch `source_url` and upload it as `dest`.
    ///
    /// Exactly one fetch and at most one create-file call are made, in that
    /// order. A failed fetch means the provider is never contacted. A source
    /// that fails mid-stream is a [`RelayError::Fetch`] even though the
    /// provider was already called.
    pub async fn relay(
        &self,
        source_url: &str,
        dest: &FileDescriptor,
        credential: &Credential,
    ) -> Result<RelayResult, RelayError> {
        if !credential.is_usable() {
            return Err(RelayError::InvalidCredential);
        }

        tracing::debug!("Fetching {}", source_url);
        let body = self.fetcher.fetch(source_url).await?;

        tracing::debug!(
            "Uploading {} ({} bytes announced)",
            dest.name(),
            body.content_length()
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );
        let failure = SourceFailure::default();
        let body = body.record_failure(failure.clone());

        let result = match self.provider.create_file(credential, dest, body).await {
            Ok(result) => result,
            Err(e) => {
                return Err(match failure.take() {
                    Some(message) => {
                        tracing::debug!("Upload of {} aborted: {}", dest.name(), e);
                        RelayError::Fetch {
                            url: source_url.to_string(),
                            message,
                        }
                    }
                    None => e,
                });
            }
        };

        tracing::info!("Relayed {} to {} as {}", source_url, dest.name(), result.remote_id);
        Ok(result)
    }
}

/// Download `source_url` over HTTP and create it in Google Drive as `dest`.
pub async fn relay(
    source_url: &str,
    dest: &FileDescriptor,
    credential: &Credential,
) -> Result<RelayResult, RelayError> {
    Relay::new(HttpFetcher::new(), DriveProvider::new())
        .relay(source_url, dest, credential)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StaticFetcher {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> Result<SourceBody, RelayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(SourceBody::new(futures::stream::iter(vec![Ok(Bytes::from_static(b"hi"))])))
        }
    }

    struct CountingProvider {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl StorageProvider for CountingProvider {
        async fn create_file(
            &self,
            _credential: &Credential,
            dest: &FileDescriptor,
            body: SourceBody,
        ) -> Result<RelayResult, RelayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let chunks: Vec<_> = body.into_stream().collect().await;
            let mut metadata = dest.resource();
            metadata.insert("chunks".to_string(), chunks.len().into());
            Ok(RelayResult {
                remote_id: "id".to_string(),
                provider_metadata: metadata,
            })
        }
    }

    #[tokio::test]
    async fn test_unusable_credential_short_circuits() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let uploads = Arc::new(AtomicUsize::new(0));
        let relay = Relay::new(
            StaticFetcher { calls: fetches.clone() },
            CountingProvider { calls: uploads.clone() },
        );

        let result = relay
            .relay("https://host/a", &FileDescriptor::new("a"), &Credential::new(""))
            .await;

        assert!(matches!(result, Err(RelayError::InvalidCredential)));
        assert_eq!(fetches.load(Ordering::SeqCst), 0);
        assert_eq!(uploads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_relay_passes_body_through() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let uploads = Arc::new(AtomicUsize::new(0));
        let relay = Relay::new(
            StaticFetcher { calls: fetches.clone() },
            CountingProvider { calls: uploads.clone() },
        );

        let result = relay
            .relay("https://host/a", &FileDescriptor::new("a"), &Credential::new("tok"))
            .await
            .unwrap();

        assert_eq!(result.provider_metadata["chunks"], 1);
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(uploads.load(Ordering::SeqCst), 1);
    }

    struct BrokenFetcher;

    #[async_trait]
    impl Fetcher for BrokenFetcher {
        async fn fetch(&self, _url: &str) -> Result<SourceBody, RelayError> {
            Ok(SourceBody::new(futures::stream::iter(vec![
                Ok(Bytes::from_static(b"partial")),
                Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "connection reset",
                )),
            ])))
        }
    }

    #[tokio::test]
    async fn test_source_error_during_upload_is_fetch_error() {
        let relay = Relay::new(BrokenFetcher, FailingReader);
        match relay
            .relay("https://host/a", &FileDescriptor::new("a"), &Credential::new("tok"))
            .await
        {
            Err(RelayError::Fetch { url, message }) => {
                assert_eq!(url, "https://host/a");
                assert!(message.contains("connection reset"));
            }
            other => panic!("expected fetch error, got {:?}", other),
        }
    }

    /// Provider that fails with its own error as soon as the body errors.
    struct FailingReader;

    #[async_trait]
    impl StorageProvider for FailingReader {
        async fn create_file(
            &self,
            _credential: &Credential,
            _dest: &FileDescriptor,
            body: SourceBody,
        ) -> Result<RelayResult, RelayError> {
            let mut stream = body.into_stream();
            while let Some(chunk) = stream.next().await {
                chunk.map_err(|e| RelayError::Provider {
                    message: format!("failed to upload file: {}", e),
                })?;
            }
            Err(RelayError::Provider {
                message: "body ended without error".to_string(),
            })
        }
    }

    #[test]
    fn test_source_body_hints() {
        let body = SourceBody::new(futures::stream::empty())
            .with_content_type("application/pdf")
            .with_content_length(42);
        assert_eq!(body.content_type(), Some("application/pdf"));
        assert_eq!(body.content_length(), Some(42));
        assert!(format!("{:?}", body).contains("application/pdf"));
    }
}
