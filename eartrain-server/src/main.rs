//! eartrain-server - HTTP API for the EarTrain ear-training app
//!
//! Every setting resolves command line > environment > TOML file > default.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use eartrain_common::auth::TokenService;
use eartrain_common::config::{load_toml_config, ConfigOverrides, ServerConfig};
use eartrain_common::db::{init_database, load_jwt_secret};
use eartrain_server::mailer::SmtpMailer;
use eartrain_server::oauth::GoogleOAuthClient;
use eartrain_server::purge::spawn_purge_task;
use eartrain_server::{build_router, AppState};
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for eartrain-server
#[derive(Parser, Debug)]
#[command(name = "eartrain-server")]
#[command(about = "HTTP API for the EarTrain ear-training app")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "EARTRAIN_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, env = "EARTRAIN_DATABASE")]
    database: Option<PathBuf>,

    /// Address to listen on (host:port)
    #[arg(short, long, env = "EARTRAIN_BIND")]
    bind: Option<String>,

    /// Token signing secret (generated and stored in the database if unset)
    #[arg(long, env = "EARTRAIN_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Frontend base URL for redirects, reset links and CORS
    #[arg(long, env = "EARTRAIN_FRONTEND_URL")]
    frontend_url: Option<String>,

    #[arg(long, env = "EARTRAIN_GOOGLE_CLIENT_ID")]
    google_client_id: Option<String>,

    #[arg(long, env = "EARTRAIN_GOOGLE_CLIENT_SECRET", hide_env_values = true)]
    google_client_secret: Option<String>,

    #[arg(long, env = "EARTRAIN_GOOGLE_REDIRECT_URI")]
    google_redirect_uri: Option<String>,

    #[arg(long, env = "EARTRAIN_SMTP_HOST")]
    smtp_host: Option<String>,

    #[arg(long, env = "EARTRAIN_SMTP_PORT")]
    smtp_port: Option<u16>,

    #[arg(long, env = "EARTRAIN_SMTP_USERNAME")]
    smtp_username: Option<String>,

    #[arg(long, env = "EARTRAIN_SMTP_PASSWORD", hide_env_values = true)]
    smtp_password: Option<String>,

    /// Sender address, e.g. "EarTrain <no-reply@example.com>"
    #[arg(long, env = "EARTRAIN_SMTP_FROM")]
    smtp_from: Option<String>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            database_path: self.database.clone(),
            bind_addr: self.bind.clone(),
            jwt_secret: self.jwt_secret.clone(),
            frontend_url: self.frontend_url.clone(),
            google_client_id: self.google_client_id.clone(),
            google_client_secret: self.google_client_secret.clone(),
            google_redirect_uri: self.google_redirect_uri.clone(),
            smtp_host: self.smtp_host.clone(),
            smtp_port: self.smtp_port,
            smtp_username: self.smtp_username.clone(),
            smtp_password: self.smtp_password.clone(),
            smtp_from: self.smtp_from.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = load_toml_config(args.config.as_deref()).context("Failed to load config")?;
    let config =
        ServerConfig::resolve(&args.overrides(), &toml_config).context("Invalid configuration")?;

    let default_filter = format!(
        "eartrain_server={level},eartrain_common={level},tower_http={level}",
        level = config.log_level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification first, before any slow startup work
    info!(
        "Starting EarTrain server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    info!("Database path: {}", config.database_path.display());

    let pool = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let secret = match &config.jwt_secret {
        Some(secret) => secret.clone(),
        None => {
            info!("No token secret configured, using the one stored in the database");
            load_jwt_secret(&pool)
                .await
                .context("Failed to load token secret")?
        }
    };

    let mut state = AppState::new(pool.clone(), TokenService::new(&secret), config.clone());

    match &config.smtp {
        Some(smtp) => {
            let mailer = SmtpMailer::new(smtp).context("Invalid SMTP configuration")?;
            state = state.with_mailer(Arc::new(mailer));
            info!("SMTP relay: {}:{}", smtp.host, smtp.port);
        }
        None => warn!("SMTP not configured; password reset emails will only be logged"),
    }

    match &config.google {
        Some(google) => {
            state = state.with_identity_provider(Arc::new(GoogleOAuthClient::new(google.clone())));
            info!("Google sign-in enabled");
        }
        None => info!("Google sign-in disabled (no client id/secret)"),
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let purge = spawn_purge_task(
        pool.clone(),
        Duration::from_secs(config.purge_interval_secs),
        shutdown_rx,
    );

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    info!("eartrain-server listening on http://{}", config.bind_addr);
    info!("Health check: http://{}/health", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = purge.await {
        warn!("Purge task ended abnormally: {}", e);
    }
    pool.close().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
