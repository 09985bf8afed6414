//! CLI configuration handling.
//!
//! Configuration lives in `<config dir>/gdrelay/config.toml`:
//!
//! ```toml
//! log_level = "info"
//!
//! [oauth]
//! client_id = "123456789.apps.googleusercontent.com"
//! client_secret = "..."
//!
//! [cache]
//! backend = "file"
//! file_name = "gdrelay-token.json"
//!
//! [drive]
//! upload_base = "https://www.googleapis.com/upload/drive/v3"
//! ```

use anyhow::{Context, Result};
use directories::ProjectDirs;
use gdrelay_core::{FileStore, OAuthConfig, StoreBackend, relay::DRIVE_UPLOAD_BASE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Path to the configuration file that was loaded.
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Logging level, used when `RUST_LOG` is not set.
    pub log_level: String,

    /// OAuth client settings.
    pub oauth: OAuthConfig,

    /// Where the credential is cached.
    pub cache: CacheConfig,

    /// Destination settings.
    pub drive: DriveConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: StoreBackend,

    /// Explicit cache file path. Overrides `file_name`.
    pub path: Option<PathBuf>,

    /// File name under `~/.credentials/`.
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    pub upload_base: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            log_level: default_log_level(),
            oauth: OAuthConfig::default(),
            cache: CacheConfig::default(),
            drive: DriveConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            path: None,
            file_name: "gdrelay-token.json".to_string(),
        }
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            upload_base: DRIVE_UPLOAD_BASE.to_string(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl CacheConfig {
    /// The credential cache file to use.
    pub fn resolve_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => FileStore::default_path(&self.file_name)
                .context("Failed to determine the default credential cache path"),
        }
    }
}

impl RelayConfig {
    /// A copy safe to print: the client secret is masked.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if !config.oauth.client_secret.is_empty() {
            config.oauth.client_secret = "[REDACTED]".to_string();
        }
        config
    }
}

/// Load configuration from `path`, or the default location, or defaults.
///
/// An explicitly given path must exist; the default location may be absent.
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig> {
    let (config_path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (default_config_path(), false),
    };

    let mut config = if config_path.exists() || required {
        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {:?}", config_path))?;
        parse_config(&contents)
            .with_context(|| format!("Failed to parse config from {:?}", config_path))?
    } else {
        RelayConfig::default()
    };

    config.config_path = config_path;
    Ok(config)
}

fn parse_config(contents: &str) -> Result<RelayConfig> {
    Ok(toml::from_str(contents)?)
}

fn default_config_path() -> PathBuf {
    project_dirs()
        .map(|d| d.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("gdrelay.toml"))
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "gdrelay")
}
