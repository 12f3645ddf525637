//! Authentication server.
//!
//! Loads configuration, connects the credential store and serves the HTTP
//! API until Ctrl+C.

use std::net::SocketAddr;
use std::sync::Arc;

use ag_server::{
    api,
    config::{CliOverrides, ServerConfig, StoreBackend},
    logging, metrics,
};
use anyhow::{Context, Error};
use authgate::{
    auth::{PasswordHasher, TokenService},
    db::{CredentialStore, Database, MemoryCredentialStore},
};
use pico_args::Arguments;
use tracing::info;

const HELP: &str = "\
Run the authgate HTTP server

USAGE:
  ag_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:3000]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  --memory                 Keep credentials in memory instead of PostgreSQL
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  CREDENTIAL_STORE         `postgres` (default) or `memory`
  DATABASE_URL             PostgreSQL connection string
  JWT_SECRET               JWT signing secret, at least 32 characters (required)
  TOKEN_TTL_SECS           Access token lifetime  [default: 900]
  PASSWORD_PEPPER          Password hashing pepper, at least 16 characters
  METRICS_BIND             Prometheus listener address (disabled when unset)
  RUST_LOG                 Log filter  [default: info]
  (See .env file for all configuration options)
";

fn parse_args() -> Result<CliOverrides, Error> {
    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = CliOverrides {
        bind: pargs.opt_value_from_str::<_, SocketAddr>("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        memory_store: pargs.contains("--memory"),
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        anyhow::bail!("Unexpected arguments: {remaining:?}");
    }

    Ok(overrides)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let overrides = parse_args()?;

    logging::init();

    let config = ServerConfig::from_env(overrides).context("Invalid configuration")?;
    info!(
        bind = %config.bind,
        store = ?config.store,
        token_ttl_secs = config.security.token_ttl_secs,
        "Configuration loaded"
    );

    if let Some(metrics_bind) = config.metrics_bind {
        metrics::init_metrics(metrics_bind).map_err(Error::msg)?;
        info!("Prometheus metrics exported on {}", metrics_bind);
    }

    let mut database = None;
    let store: Arc<dyn CredentialStore> = match config.store {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory credential store; identities are lost on exit");
            Arc::new(MemoryCredentialStore::new())
        }
        StoreBackend::Postgres => {
            info!("Connecting to database");
            let db = Database::new(&config.database)
                .await
                .context("Failed to connect to database")?;
            db.ensure_schema()
                .await
                .context("Failed to create database schema")?;
            info!("Database connected successfully");

            let store = Arc::new(db.credential_store());
            database = Some(db);
            store
        }
    };

    let hasher = PasswordHasher::new(config.hashing, config.security.password_pepper.clone())
        .context("Invalid password hashing parameters")?;
    let tokens = Arc::new(TokenService::new(
        config.security.jwt_secret.as_bytes(),
        config.token_ttl()?,
    ));

    let app = api::create_router(api::AppState::new(store, hasher, tokens));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
