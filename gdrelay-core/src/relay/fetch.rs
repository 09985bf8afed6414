//! Plain HTTP source fetching.

use async_trait::async_trait;
use futures::TryStreamExt;
use percent_encoding::percent_decode_str;
use reqwest::{Client, header};

use super::{Fetcher, RelayError, SourceBody};

/// Fetches sources with a single unauthenticated GET.
///
/// By default any non-2xx status fails the fetch so that error pages are
/// never uploaded as file content. [`accept_any_status`](Self::accept_any_status)
/// turns that check off.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
    require_success: bool,
}

impl HttpFetcher {
    /// Create a fetcher with a default HTTP client.
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Create a fetcher around an existing HTTP client.
    pub fn with_client(http: Client) -> Self {
        Self {
            http,
            require_success: true,
        }
    }

    /// Forward the body whatever the response status.
    pub fn accept_any_status(mut self) -> Self {
        self.require_success = false;
        self
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<SourceBody, RelayError> {
        let parsed = url::Url::parse(url).map_err(|e| RelayError::InvalidSource {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let response = self
            .http
            .get(parsed)
            .send()
            .await
            .map_err(|e| RelayError::Fetch {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            if self.require_success {
                return Err(RelayError::Fetch {
                    url: url.to_string(),
                    message: format!("server answered {}", status),
                });
            }
            tracing::warn!("Forwarding body of {} despite status {}", url, status);
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let content_length = response.content_length();

        let stream = response.bytes_stream().map_err(std::io::Error::other);

        let mut body = SourceBody::new(stream);
        if let Some(content_type) = content_type {
            body = body.with_content_type(content_type);
        }
        if let Some(content_length) = content_length {
            body = body.with_content_length(content_length);
        }
        Ok(body)
    }
}

/// Decode a query-escaped URL (`%XX` sequences and `+` for space).
///
/// Signed download links handed out by document services often arrive in
/// this form.
pub fn unescape_source_url(escaped: &str) -> Result<String, RelayError> {
    let spaced = escaped.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| RelayError::InvalidSource {
            url: escaped.to_string(),
            message: format!("escaped URL is not UTF-8: {}", e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unescape_source_url() {
        let escaped = "https%3A%2F%2Fhost%2Fsigned.pdf%3Ftoken%3Da%2Bb";
        assert_eq!(
            unescape_source_url(escaped).unwrap(),
            "https://host/signed.pdf?token=a+b"
        );
    }

    #[test]
    fn test_unescape_plus_is_space() {
        assert_eq!(unescape_source_url("a+b").unwrap(), "a b");
    }

    #[test]
    fn test_unescape_invalid_utf8() {
        assert!(matches!(
            unescape_source_url("%FF%FE"),
            Err(RelayError::InvalidSource { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_rejects_unparseable_url() {
        let result = HttpFetcher::new().fetch("not a url").await;
        assert!(matches!(result, Err(RelayError::InvalidSource { .. })));
    }
}
