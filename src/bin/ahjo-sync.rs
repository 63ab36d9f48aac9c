//! # Ahjo Sync CLI
//!
//! Operator tool for the Ahjo token lifecycle and for inspecting paginated
//! listings. Tokens and refresh locks live in the file-backed stores named in
//! the `[token]` configuration section, so consecutive invocations share them.

use ahjo_sync::auth::{FileLockService, FileTokenStore, TokenManager};
use ahjo_sync::config::{AhjoSyncConfig, ConfigManager};
use ahjo_sync::http::{HttpClient, ReqwestHttpClient};
use ahjo_sync::logging::init_structured_logging;
use ahjo_sync::messaging::InMemoryQueueBackend;
use ahjo_sync::proxy::{AhjoProxy, InMemoryMeetingMotionStore, MigrationExecutor};
use ahjo_sync::source::{AhjoSourceIterator, SourceOptions};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "ahjo-sync")]
#[command(about = "Ahjo API token and source maintenance")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file (default: $AHJO_SYNC_CONFIG_PATH or config/ahjo-sync.toml)
    #[arg(short, long, env = "AHJO_SYNC_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// OAuth2 token maintenance
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },

    /// Paginated listing inspection
    Source {
        #[command(subcommand)]
        command: SourceCommands,
    },
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Print the authorization URL that starts the code flow
    AuthUrl {
        #[arg(long)]
        state: Option<String>,
    },

    /// Exchange an authorization code for the first token
    Get {
        #[arg(long)]
        code: String,
    },

    /// Refresh the stored token with its refresh token
    Refresh {
        /// Only refresh when the stored token has expired
        #[arg(long)]
        if_expired: bool,
    },

    /// Show whether a valid token is stored
    Status,
}

#[derive(Subcommand)]
pub enum SourceCommands {
    /// Print the page URLs of a listing
    Urls {
        url: String,

        /// Cap the number of pages
        #[arg(long)]
        limit_pages: Option<u64>,
    },

    /// Print the number of rows a listing walk covers
    Count {
        url: String,

        #[arg(long)]
        limit_pages: Option<u64>,
    },
}

/// Listing inspection never migrates anything
struct DisabledMigrationExecutor;

#[async_trait]
impl MigrationExecutor for DisabledMigrationExecutor {
    async fn run(&self, endpoint: &str, entity_id: &str) -> i32 {
        warn!(endpoint, entity_id, "Migrations are not available from the CLI");
        0
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<AhjoSyncConfig> {
    let manager = match path {
        Some(path) => ConfigManager::load_from_file(path),
        None => ConfigManager::load(),
    }
    .context("failed to load configuration")?;

    let config = manager.config().clone();
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn token_manager(config: &AhjoSyncConfig, http: Arc<dyn HttpClient>) -> TokenManager {
    TokenManager::from_config(
        config,
        http,
        Arc::new(FileTokenStore::new(&config.token.store_path)),
        Arc::new(FileLockService::new(&config.token.lock_dir)),
    )
}

fn format_expiry(expires_at: i64) -> String {
    Utc.timestamp_opt(expires_at, 0)
        .single()
        .map_or_else(|| expires_at.to_string(), |at| at.to_rfc3339())
}

async fn run_token(command: TokenCommands, tokens: &TokenManager) -> Result<()> {
    match command {
        TokenCommands::AuthUrl { state } => {
            println!("{}", tokens.authorization_url(state.as_deref())?);
        }
        TokenCommands::Get { code } => {
            let token = tokens.refresh_auth_token(Some(&code)).await?;
            println!("Token stored, expires {}", format_expiry(token.expires_at));
        }
        TokenCommands::Refresh { if_expired } => {
            if if_expired {
                match tokens.refresh_if_expired().await? {
                    Some(token) => {
                        println!("Token refreshed, expires {}", format_expiry(token.expires_at));
                    }
                    None => println!("Token still valid, nothing to do"),
                }
            } else {
                let token = tokens.refresh_auth_token(None).await?;
                println!("Token refreshed, expires {}", format_expiry(token.expires_at));
            }
        }
        TokenCommands::Status => {
            println!("environment: {}", tokens.environment());
            println!("configured:  {}", tokens.is_configured().await);
            println!("valid:       {}", tokens.check_auth_token().await);
            let expires_at = tokens.get_auth_token_expiration().await;
            if expires_at > 0 {
                println!("expires:     {}", format_expiry(expires_at));
            }
        }
    }
    Ok(())
}

async fn run_source(
    command: SourceCommands,
    config: &AhjoSyncConfig,
    tokens: TokenManager,
    http: Arc<dyn HttpClient>,
) -> Result<()> {
    let proxy = Arc::new(AhjoProxy::new(
        config,
        Arc::new(tokens),
        http,
        Arc::new(InMemoryQueueBackend::new()),
        Arc::new(DisabledMigrationExecutor),
        Arc::new(InMemoryMeetingMotionStore::new()),
    )?);

    let mut options = SourceOptions::from(&config.source);
    match command {
        SourceCommands::Urls { url, limit_pages } => {
            options.limit_pages = limit_pages.or(options.limit_pages);
            let iterator = AhjoSourceIterator::new(proxy, &url, options)?;
            for page_url in iterator.build_urls().await? {
                println!("{page_url}");
            }
        }
        SourceCommands::Count { url, limit_pages } => {
            options.limit_pages = limit_pages.or(options.limit_pages);
            let iterator = AhjoSourceIterator::new(proxy, &url, options)?;
            println!("{}", iterator.count().await?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_structured_logging();

    let config = load_config(cli.config.as_ref())?;
    info!(environment = %config.environment, "🚀 ahjo-sync starting");

    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new(config.request_timeout())?);
    let tokens = token_manager(&config, http.clone());

    match cli.command {
        Commands::Token { command } => run_token(command, &tokens).await,
        Commands::Source { command } => run_source(command, &config, tokens, http).await,
    }
}
