//! Google Drive "files.create" with a streamed media body.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::{Body, Client, header};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{RelayError, SourceBody, StorageProvider};
use crate::credential::Credential;
use crate::model::{FileDescriptor, RelayResult};

/// Google Drive upload API base URL.
pub const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

/// Fields requested back from Drive for the created file.
const CREATE_FIELDS: &str = "id,name,mimeType,size,parents,createdTime,md5Checksum,webViewLink";

/// Media type used when the source did not report one.
const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Creates Drive files with one `multipart/related` request.
///
/// The first part is the JSON resource from the [`FileDescriptor`], the
/// second part is the source body, streamed through without buffering.
#[derive(Debug, Clone)]
pub struct DriveProvider {
    http: Client,
    upload_base: String,
}

impl DriveProvider {
    /// Create a provider against the public Drive API.
    pub fn new() -> Self {
        Self::with_upload_base(DRIVE_UPLOAD_BASE)
    }

    /// Create a provider against a different upload endpoint.
    pub fn with_upload_base(upload_base: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            upload_base: upload_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Replace the HTTP client.
    pub fn with_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    /// The upload endpoint in use.
    pub fn upload_base(&self) -> &str {
        &self.upload_base
    }
}

impl Default for DriveProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap a source body in a `multipart/related` envelope.
///
/// Returns the envelope stream and its `Content-Type` header value.
fn multipart_body(
    resource: &Map<String, Value>,
    body: SourceBody,
) -> Result<(Body, String), RelayError> {
    let metadata = serde_json::to_string(resource).map_err(|e| RelayError::Provider {
        message: format!("failed to serialize file metadata: {}", e),
    })?;

    let boundary = format!("gdrelay-{}", Uuid::new_v4().simple());
    let media_type = body
        .content_type()
        .unwrap_or(FALLBACK_MEDIA_TYPE)
        .to_string();

    let head = format!(
        "--{boundary}\r\n\
         Content-Type: application/json; charset=UTF-8\r\n\r\n\
         {metadata}\r\n\
         --{boundary}\r\n\
         Content-Type: {media_type}\r\n\r\n"
    );
    let tail = format!("\r\n--{boundary}--\r\n");

    let stream = futures::stream::iter([Ok::<_, std::io::Error>(Bytes::from(head))])
        .chain(body.into_stream())
        .chain(futures::stream::iter([Ok(Bytes::from(tail))]));

    Ok((
        Body::wrap_stream(stream),
        format!("multipart/related; boundary={}", boundary),
    ))
}

#[async_trait]
impl StorageProvider for DriveProvider {
    async fn create_file(
        &self,
        credential: &Credential,
        dest: &FileDescriptor,
        body: SourceBody,
    ) -> Result<RelayResult, RelayError> {
        let url = format!("{}/files", self.upload_base);
        let (envelope, content_type) = multipart_body(&dest.resource(), body)?;

        let response = self
            .http
            .post(&url)
            .header(header::AUTHORIZATION, credential.authorization_header())
            .header(header::CONTENT_TYPE, content_type)
            .query(&[("uploadType", "multipart"), ("fields", CREATE_FIELDS)])
            .body(envelope)
            .send()
            .await
            .map_err(|e| RelayError::Provider {
                message: format!("failed to upload file: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Upload {
                status: status.as_u16(),
                body,
            });
        }

        let created: Map<String, Value> =
            response.json().await.map_err(|e| RelayError::Provider {
                message: format!("failed to parse upload response: {}", e),
            })?;

        RelayResult::from_response(created).ok_or_else(|| RelayError::Provider {
            message: "upload response has no file id".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_base_trailing_slash() {
        let provider = DriveProvider::with_upload_base("http://localhost:1234/upload/");
        assert_eq!(provider.upload_base(), "http://localhost:1234/upload");
        assert_eq!(DriveProvider::new().upload_base(), DRIVE_UPLOAD_BASE);
    }

    #[test]
    fn test_multipart_content_type_has_boundary() {
        let body = SourceBody::new(futures::stream::empty());
        let (_, content_type) =
            multipart_body(&FileDescriptor::new("a.txt").resource(), body).unwrap();
        assert!(content_type.starts_with("multipart/related; boundary=gdrelay-"));
    }
}
