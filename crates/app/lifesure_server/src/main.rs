//! LifeSure API server binary.
//!
//! Every option can also be given through the environment (a `.env` file in
//! the working directory is honoured).

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use lifesure_api::config::{ApiConfig, default_public_base_url};
use lifesure_core::auth::jwt::{DEFAULT_TOKEN_TTL_SECS, resolve_jwt_secret};
use lifesure_core::store::{MemoryStore, PgStore, Store};
use lifesure_core::uploads::DEFAULT_MAX_FILE_BYTES;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    Postgres,
    /// In-process store; data is lost on exit.
    Memory,
}

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "lifesure_server", about = "LifeSure insurance API server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:5000")]
    bind_addr: String,

    /// Storage backend.
    #[arg(long, env = "STORE_BACKEND", value_enum, default_value_t = Backend::Postgres)]
    store: Backend,

    /// PostgreSQL connection URL. Required for the postgres backend.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Token signing secret. Without it a generated secret is kept in the
    /// user data directory.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5)]
    max_connections: u32,

    /// Directory for uploaded files, served under `/uploads`.
    #[arg(long, env = "UPLOAD_DIR", default_value = "uploads")]
    upload_dir: PathBuf,

    /// Base URL for stored file references. Defaults to
    /// `http://localhost:<port>`.
    #[arg(long, env = "PUBLIC_BASE_URL")]
    public_base_url: Option<String>,

    /// Access token lifetime in seconds.
    #[arg(long, env = "TOKEN_TTL_SECS", default_value_t = DEFAULT_TOKEN_TTL_SECS)]
    token_ttl_secs: i64,

    /// Per-file upload cap in bytes.
    #[arg(long, env = "MAX_FILE_BYTES", default_value_t = DEFAULT_MAX_FILE_BYTES)]
    max_file_bytes: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,lifesure_api=debug,lifesure_core=debug".into()),
        )
        .init();

    let args = Args::parse();
    info!(bind_addr = %args.bind_addr, store = ?args.store, "starting lifesure_server");

    let store: Arc<dyn Store> = match args.store {
        Backend::Postgres => {
            let database_url = args
                .database_url
                .as_deref()
                .ok_or("DATABASE_URL is required for the postgres backend")?;
            info!(max_connections = args.max_connections, "configuring connection pool");
            let pool = PgPoolOptions::new()
                .max_connections(args.max_connections)
                .acquire_timeout(std::time::Duration::from_secs(30))
                .connect(database_url)
                .await?;

            info!("running database migrations");
            lifesure_api::migrate(&pool).await?;
            Arc::new(PgStore::new(pool))
        }
        Backend::Memory => {
            warn!("using the in-memory store, data will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };

    tokio::fs::create_dir_all(&args.upload_dir).await?;

    let config = ApiConfig {
        public_base_url: args
            .public_base_url
            .unwrap_or_else(|| default_public_base_url(&args.bind_addr)),
        bind_addr: args.bind_addr,
        jwt_secret: resolve_jwt_secret(args.jwt_secret.as_deref()),
        upload_dir: args.upload_dir,
        token_ttl_secs: args.token_ttl_secs,
        max_file_bytes: args.max_file_bytes,
    };

    let state = lifesure_api::AppState::new(store, config.clone());
    let app = lifesure_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, uploads = %config.upload_dir.display(), "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("could not listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("could not listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl-C received, shutting down"),
        _ = terminate => info!("SIGTERM received, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "lifesure_server",
            "--store",
            "memory",
            "--jwt-secret",
            "flag-secret",
            "--max-file-bytes",
            "1024",
        ])
        .unwrap();
        assert_eq!(args.store, Backend::Memory);
        assert_eq!(args.jwt_secret.as_deref(), Some("flag-secret"));
        assert_eq!(args.max_file_bytes, 1024);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn sigterm_triggers_shutdown() {
        use tokio::signal::unix::{SignalKind, signal};

        // Keep a listener installed so the signal never reaches the default handler.
        let _guard = signal(SignalKind::terminate()).unwrap();
        let shutdown = tokio::spawn(shutdown_signal());
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        tokio::time::timeout(std::time::Duration::from_secs(5), shutdown)
            .await
            .expect("shutdown after SIGTERM")
            .unwrap();
    }

    #[test]
    fn arguments_are_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
