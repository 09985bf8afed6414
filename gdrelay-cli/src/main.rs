//! gdrelay CLI
//!
//! Command-line interface for copying a URL into Google Drive.
//!
//! # Usage
//!
//! ```bash
//! # Authorize once; the credential is cached in ~/.credentials/
//! gdrelay auth
//!
//! # Download a file and create it in Drive
//! gdrelay send https://example.com/signed.pdf --name test.pdf
//!
//! # Show the effective configuration
//! gdrelay show-config
//! ```

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use gdrelay_core::{
    Authorizer, Credential, CredentialStore, DriveProvider, FileDescriptor, HttpFetcher, Relay,
    StdinPrompt, create_store, unescape_source_url,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

mod config;

use config::RelayConfig;

#[derive(Parser)]
#[command(name = "gdrelay")]
#[command(about = "Download a file from a URL and upload it into Google Drive")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Obtain a credential and cache it
    Auth {
        /// Run the browser flow even if a credential is cached
        #[arg(short, long)]
        force: bool,
    },

    /// Download a URL and create it as a new Drive file
    Send {
        /// Source URL
        url: String,

        /// Name of the file to create
        #[arg(short, long)]
        name: String,

        /// MIME type of the created file
        #[arg(long)]
        mime_type: Option<String>,

        /// Parent folder ID (repeatable)
        #[arg(long = "parent")]
        parents: Vec<String>,

        /// Description of the created file
        #[arg(long)]
        description: Option<String>,

        /// The URL is query-escaped and must be decoded first
        #[arg(long)]
        escaped: bool,

        /// Upload the body even if the source answers with an error status
        #[arg(long)]
        accept_any_status: bool,
    },

    /// Print the effective configuration
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::load_config(cli.config.as_deref())?;
    init_logging(&config.log_level, cli.verbose);
    info!("Loaded configuration from {:?}", config.config_path);

    match cli.command {
        Commands::Auth { force } => auth(&config, force).await,
        Commands::Send {
            url,
            name,
            mime_type,
            parents,
            description,
            escaped,
            accept_any_status,
        } => {
            let mut dest = FileDescriptor::new(name);
            if let Some(mime_type) = mime_type {
                dest = dest.with_mime_type(mime_type);
            }
            if !parents.is_empty() {
                dest = dest.with_parents(parents);
            }
            if let Some(description) = description {
                dest = dest.with_description(description);
            }
            send(&config, &url, dest, escaped, accept_any_status).await
        }
        Commands::ShowConfig => show_config(&config),
    }
}

fn init_logging(level: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn authorizer(config: &RelayConfig) -> Result<Authorizer<Box<dyn CredentialStore>, StdinPrompt>> {
    if config.oauth.client_id.trim().is_empty() {
        bail!(
            "No OAuth client configured. Set [oauth] client_id and client_secret in {:?}",
            config.config_path
        );
    }

    let store = create_store(config.cache.backend, config.cache.resolve_path()?);
    Authorizer::new(config.oauth.clone(), store, StdinPrompt::new())
        .context("Invalid OAuth configuration")
}

async fn obtain_credential(config: &RelayConfig) -> Result<Credential> {
    authorizer(config)?
        .obtain()
        .await
        .context("Authorization failed")
}

async fn auth(config: &RelayConfig, force: bool) -> Result<()> {
    let authorizer = authorizer(config)?;

    if force {
        let credential = authorizer
            .authorize_from_web()
            .await
            .context("Authorization failed")?;
        authorizer
            .store()
            .save(&credential)
            .await
            .context("Unable to cache OAuth token")?;
    } else {
        authorizer.obtain().await.context("Authorization failed")?;
    }

    println!("Credential cached at {}", authorizer.store().location());
    Ok(())
}

async fn send(
    config: &RelayConfig,
    url: &str,
    dest: FileDescriptor,
    escaped: bool,
    accept_any_status: bool,
) -> Result<()> {
    let source_url = if escaped {
        unescape_source_url(url)?
    } else {
        url.to_string()
    };

    let credential = obtain_credential(config).await?;

    let mut fetcher = HttpFetcher::new();
    if accept_any_status {
        fetcher = fetcher.accept_any_status();
    }
    let provider = DriveProvider::with_upload_base(&config.drive.upload_base);

    let created = Relay::new(fetcher, provider)
        .relay(&source_url, &dest, &credential)
        .await
        .with_context(|| format!("Failed to relay {}", source_url))?;

    println!("{}", serde_json::to_string_pretty(&created)?);
    Ok(())
}

fn show_config(config: &RelayConfig) -> Result<()> {
    println!("# {}", config.config_path.display());
    print!("{}", toml::to_string_pretty(&config.redacted())?);
    Ok(())
}
