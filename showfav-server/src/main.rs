//! showfav-server - show catalog aggregator with session favorites
//!
//! Fronts the upstream show catalog for browsing and search, and keeps a
//! per-session favorites record in a shared SQLite store.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use showfav_common::config::{self, ConfigOverrides, ServerConfig, TomlConfig};
use showfav_server::session::CookiePolicy;
use showfav_server::store::SessionStore;
use showfav_server::upstream::CatalogClient;
use showfav_server::{build_router, AppState};

const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Command-line arguments for showfav-server
#[derive(Parser, Debug)]
#[command(name = "showfav-server")]
#[command(about = "Show catalog aggregator with session favorites")]
#[command(version)]
struct Args {
    /// Path to config.toml
    #[arg(short, long, env = "SHOWFAV_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "SHOWFAV_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "SHOWFAV_PORT")]
    port: Option<u16>,

    /// Upstream catalog base URL
    #[arg(long, env = "SHOWFAV_UPSTREAM_URL")]
    upstream_url: Option<String>,

    /// Session store database URL
    #[arg(long, env = "SHOWFAV_DATABASE_URL")]
    database_url: Option<String>,

    /// Deployment mode: development or production
    #[arg(long, env = "SHOWFAV_ENV")]
    mode: Option<String>,

    /// Secret used to sign session cookies
    #[arg(long, env = "SESSION_SECRET", hide_env_values = true)]
    session_secret: Option<String>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            upstream_url: self.upstream_url.clone(),
            database_url: self.database_url.clone(),
            mode: self.mode.clone(),
            session_secret: self.session_secret.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "showfav_server=info,showfav_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting showfav-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let file_config = match config::resolve_config_path(args.config.as_deref()) {
        Some(path) => config::load_toml_config(&path)?,
        None => TomlConfig::default(),
    };
    let config = ServerConfig::resolve(args.overrides(), file_config)?;
    info!("Deployment mode: {}", config.mode);
    info!("Upstream catalog: {}", config.upstream_url);

    ensure_sqlite_parent_dir(&config.database_url)?;

    // Fail fast: a store that cannot be reached at startup must not look like empty sessions
    let store = SessionStore::connect(&config.database_url, config.session_ttl)
        .await
        .with_context(|| format!("Failed to connect to session store {}", config.database_url))?;
    info!("✓ Connected to session store");

    spawn_expiry_task(store.clone());

    let catalog = CatalogClient::with_timeout(&config.upstream_url, config.upstream_timeout)
        .context("Failed to create upstream catalog client")?;
    let cookies = CookiePolicy::new(config.mode, &config.session_secret, config.session_ttl);

    let state = AppState::new(catalog, store.clone(), cookies);
    let app = build_router(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    info!("showfav-server listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    store.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Create the folder holding a file-backed SQLite database
fn ensure_sqlite_parent_dir(database_url: &str) -> Result<()> {
    let Some(path) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Store-side expiry: periodically delete expired session records
fn spawn_expiry_task(store: SessionStore) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match store.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "Purged expired sessions"),
                Err(e) => warn!(error = %e, "Session purge failed"),
            }
        }
    });
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
