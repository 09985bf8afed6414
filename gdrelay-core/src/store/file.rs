//! JSON file credential storage.
//!
//! The default location is `~/.credentials/<escaped name>`. The parent
//! directory is created owner-only (`0700`) and the file itself is written
//! `0600` on unix.

use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use super::{CredentialStore, StoreError};
use crate::credential::Credential;

/// Directory under the home directory holding cached credentials.
const CREDENTIALS_DIR: &str = ".credentials";

/// Characters left alone when escaping a cache file name.
const FILE_NAME_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Credential store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store at the given path.
    ///
    /// Nothing is touched on disk until the first [`save`](CredentialStore::save).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default cache path for a file name: `<home>/.credentials/<escaped name>`.
    pub fn default_path(file_name: &str) -> Result<PathBuf, StoreError> {
        let dirs = directories::BaseDirs::new().ok_or_else(|| StoreError::Backend {
            message: "home directory not available".to_string(),
        })?;

        Ok(dirs
            .home_dir()
            .join(CREDENTIALS_DIR)
            .join(escape_file_name(file_name)))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            location: self.location(),
            source,
        }
    }

    async fn ensure_parent_dir(&self) -> Result<(), StoreError> {
        let Some(parent) = self.path.parent() else {
            return Ok(());
        };
        if parent.as_os_str().is_empty() {
            return Ok(());
        }

        let mut builder = tokio::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(0o700);

        builder
            .create(parent)
            .await
            .map_err(|e| self.io_error(e))
    }
}

/// Escape a file name the way URL query components are escaped: spaces
/// become `+`, everything else outside the unreserved set is percent-encoded.
fn escape_file_name(file_name: &str) -> String {
    file_name
        .split(' ')
        .map(|part| utf8_percent_encode(part, FILE_NAME_ESCAPE).to_string())
        .collect::<Vec<_>>()
        .join("+")
}

#[async_trait]
impl CredentialStore for FileStore {
    async fn load(&self) -> Result<Credential, StoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    location: self.location(),
                });
            }
            Err(e) => return Err(self.io_error(e)),
        };

        serde_json::from_str(&contents).map_err(|source| StoreError::Malformed {
            location: self.location(),
            source,
        })
    }

    async fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        self.ensure_parent_dir().await?;

        let contents = serde_json::to_string_pretty(credential)?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options
            .open(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        // `mode` only applies on creation; tighten a file that already existed.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| self.io_error(e))?;
        }
        file.write_all(contents.as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        file.flush().await.map_err(|e| self.io_error(e))?;

        tracing::debug!("Wrote credential to {}", self.path.display());
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn test_store() -> (FileStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("token.json");
        (FileStore::new(path), temp_dir)
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let (store, _temp) = test_store();
        let result = store.load().await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let (store, _temp) = test_store();
        let credential = Credential::new("access")
            .with_refresh_token("refresh")
            .with_expiry(Utc::now() + chrono::Duration::hours(1));

        store.save(&credential).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded, credential);
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let (store, _temp) = test_store();

        store.save(&Credential::new("first")).await.unwrap();
        store.save(&Credential::new("second")).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.access_token.expose(), "second");
    }

    #[tokio::test]
    async fn test_load_garbage_is_malformed() {
        let (store, _temp) = test_store();
        store.ensure_parent_dir().await.unwrap();
        tokio::fs::write(store.path(), "not json").await.unwrap();

        let result = store.load().await;
        assert!(matches!(result, Err(StoreError::Malformed { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_permissions_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let (store, _temp) = test_store();
        store.save(&Credential::new("access")).await.unwrap();

        let dir_mode = std::fs::metadata(store.path().parent().unwrap())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(dir_mode & 0o777, 0o700);

        let file_mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(file_mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_save_tightens_existing_file() {
        use std::os::unix::fs::PermissionsExt;

        let (store, _temp) = test_store();
        store.save(&Credential::new("first")).await.unwrap();
        std::fs::set_permissions(store.path(), std::fs::Permissions::from_mode(0o644)).unwrap();

        store.save(&Credential::new("second")).await.unwrap();

        let file_mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(file_mode & 0o777, 0o600);
        assert_eq!(store.load().await.unwrap().access_token.expose(), "second");
    }

    #[test]
    fn test_escape_file_name() {
        assert_eq!(escape_file_name("drive-token.json"), "drive-token.json");
        assert_eq!(escape_file_name("a b/c.json"), "a+b%2Fc.json");
        assert_eq!(escape_file_name("x+y~z.json"), "x%2By~z.json");
    }

    #[test]
    fn test_default_path_layout() {
        if let Ok(path) = FileStore::default_path("gdrelay-token.json") {
            assert!(path.ends_with(".credentials/gdrelay-token.json"));
        }
    }
}
