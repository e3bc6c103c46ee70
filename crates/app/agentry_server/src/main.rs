//! Agentry API server binary.
//!
//! Wires the agent store and identity provider client into the verification
//! gate once at startup, then serves the API until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use agentry_api::config::ApiConfig;
use agentry_core::agents::{AgentStore, MemoryAgentStore, PgAgentStore};
use agentry_core::gate::VerificationGate;
use agentry_core::identity::UserInfoClient;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "agentry_server", about = "Agentry API server")]
struct Args {
    /// Port to listen on (0 = ephemeral). Overrides the port in `BIND_ADDR`.
    #[arg(long)]
    port: Option<u16>,

    /// PostgreSQL connection URL.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Identity provider base URL or domain (`/userinfo` is appended).
    #[arg(long, env = "IDENTITY_PROVIDER_URL")]
    identity_provider_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Keep agents in process memory instead of PostgreSQL.
    #[arg(long, default_value_t = false)]
    memory_store: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| {
                    tracing_subscriber::EnvFilter::try_new(
                        "info,agentry_api=debug,agentry_core=debug",
                    )
                })?,
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env();
    if let Some(url) = args.database_url {
        config.pg_connection_url = url;
    }
    if let Some(url) = args.identity_provider_url {
        config.identity_provider_url = url;
    }
    if let Some(port) = args.port {
        let host = config
            .bind_addr
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "127.0.0.1".into());
        config.bind_addr = format!("{host}:{port}");
    }

    info!(
        bind_addr = %config.bind_addr,
        identity_provider = %config.identity_provider_url,
        memory_store = args.memory_store,
        "starting agentry_server"
    );

    let store: Arc<dyn AgentStore> = if args.memory_store {
        warn!("using in-memory agent store; agents are lost on restart");
        Arc::new(MemoryAgentStore::new())
    } else {
        info!(max_connections = args.max_connections, "configuring connection pool");
        let pool = PgPoolOptions::new()
            .max_connections(args.max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.pg_connection_url)
            .await?;

        info!("running database migrations");
        agentry_core::migrate::migrate(&pool).await?;

        Arc::new(PgAgentStore::new(pool))
    };

    let provider = UserInfoClient::new(
        &config.identity_provider_url,
        config.identity_provider_timeout,
    )?;
    info!(endpoint = %provider.endpoint(), "identity provider configured");

    let gate = VerificationGate::new(store, Arc::new(provider));
    let app = agentry_api::router(agentry_api::AppState { gate });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "REST API listening");

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown requested");
            }
            shutdown.cancel();
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("REST API stopped");
    Ok(())
}
