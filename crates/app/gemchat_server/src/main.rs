//! Gemchat HTTP server binary.
//!
//! Serves the chat page, the `/api/ai` relay and the JSON API. With
//! `--embedded-db` it runs its own PostgreSQL instance instead of connecting
//! to `DATABASE_URL`.

use clap::Parser;
use gemchat_api::config::ApiConfig;
use gemchat_core::db::DbManager;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

const DEFAULT_LOG_FILTER: &str = "info,gemchat_api=debug,gemchat_core=debug";

/// CLI arguments for the server.
#[derive(Parser, Debug)]
#[command(name = "gemchat_server", version, about = "Gemchat HTTP server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3000")]
    bind: String,

    /// PostgreSQL connection URL. Ignored with `--embedded-db`.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/gemchat"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Start a local PostgreSQL under the user data directory (needs `pg_config` on PATH).
    #[arg(long, default_value_t = false)]
    embedded_db: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let args = Args::parse();

    let mut embedded = None;
    let database_url = if args.embedded_db {
        let mut db = DbManager::with_default_data_dir().await?;
        db.setup().await?;
        db.start().await?;
        let url = db.connection_url();
        embedded = Some(db);
        url
    } else {
        args.database_url
    };

    info!(
        max_connections = args.max_connections,
        embedded = args.embedded_db,
        "configuring connection pool"
    );

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&database_url)
        .await?;

    info!("running database migrations");
    gemchat_api::migrate(&pool).await?;

    let config = ApiConfig {
        bind_addr: args.bind,
        pg_connection_url: database_url,
        ..ApiConfig::from_env()
    };
    if config.gemini.api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; relay requests will fail upstream");
    }
    info!(model = %config.gemini.model, "Gemini relay configured");

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    let app = gemchat_api::router(gemchat_api::AppState::new(pool.clone(), config));

    info!(addr = %local_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    if let Some(mut db) = embedded {
        db.stop().await?;
    }
    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("ctrl-c received, shutting down");
}
