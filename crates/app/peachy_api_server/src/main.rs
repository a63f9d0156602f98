//! PEACHY auth and session API server binary.
//!
//! Serves the Discord login flow, session endpoints and Discord proxies.
//! Sessions live in PostgreSQL when `DATABASE_URL` is set, in memory otherwise.

use std::sync::Arc;

use clap::Parser;
use peachy_api::config::ApiConfig;
use peachy_core::session::{MemorySessionStore, PgSessionStore, SessionStore};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "peachy_api_server", about = "PEACHY auth and session API server")]
struct Args {
    /// Port to listen on. Overrides the port of `BIND_ADDR`.
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// PostgreSQL connection URL.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,peachy_api=debug,peachy_core=debug".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env();
    if let Some(port) = args.port {
        config.bind_addr = with_port(&config.bind_addr, port);
    }
    if args.database_url.is_some() {
        config.database_url = args.database_url;
    }
    if config.client_id.is_empty() || config.client_secret.is_empty() {
        warn!("BOT_CLIENT_ID or BOT_CLIENT_SECRET is not set; Discord sign-in will fail");
    }

    info!(
        bind_addr = %config.bind_addr,
        app_url = %config.app_url,
        production = config.production,
        "starting peachy_api_server"
    );

    let sessions: Arc<dyn SessionStore> = match config.database_url.as_deref() {
        Some(url) => {
            info!(max_connections = args.max_connections, "configuring connection pool");
            let pool = PgPoolOptions::new()
                .max_connections(args.max_connections)
                .acquire_timeout(std::time::Duration::from_secs(30))
                .connect(url)
                .await?;

            info!("running database migrations");
            peachy_api::migrate(&pool).await?;
            Arc::new(PgSessionStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL is not set; sessions are kept in memory");
            Arc::new(MemorySessionStore::new())
        }
    };

    let state = peachy_api::AppState::new(config.clone(), sessions);
    let _cleanup = state.sign_in_states.spawn_cleanup_task();

    let app = peachy_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

/// Replace the port of a `host:port` bind address.
fn with_port(bind_addr: &str, port: u16) -> String {
    let host = bind_addr
        .rsplit_once(':')
        .map(|(host, _)| host)
        .unwrap_or(bind_addr);
    format!("{host}:{port}")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
