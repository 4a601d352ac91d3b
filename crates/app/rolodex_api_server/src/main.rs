//! Rolodex API server binary.

use std::sync::Arc;

use clap::Parser;
use rolodex_api::config::ApiConfig;
use rolodex_core::auth::cache::{CacheStore, MemoryCacheStore, RedisCacheStore};
use rolodex_core::auth::queries::PgUserRepository;
use rolodex_core::email::LogEmailSender;
use tracing::{info, warn};

/// CLI arguments. Everything else is read from the environment.
#[derive(Parser, Debug)]
#[command(name = "rolodex_api_server", about = "Rolodex contacts API server")]
struct Args {
    /// Address to listen on; overrides `BIND_ADDR`.
    #[arg(long)]
    bind: Option<String>,

    /// PostgreSQL connection URL; overrides `DATABASE_URL`.
    #[arg(long)]
    database_url: Option<String>,

    /// Redis URL for the user cache; overrides `REDIS_URL`.
    #[arg(long)]
    redis_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = rolodex_core::db::DEFAULT_MAX_CONNECTIONS)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,rolodex_api=debug,rolodex_core=debug")
            }),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env()?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(url) = args.database_url {
        config.database_url = url;
    }
    if let Some(url) = args.redis_url {
        config.redis_url = Some(url);
    }

    info!(
        bind_addr = %config.bind_addr,
        max_connections = args.max_connections,
        "starting rolodex_api_server"
    );

    let pool = rolodex_core::db::connect(&config.database_url, args.max_connections).await?;

    info!("running database migrations");
    rolodex_api::migrate(&pool).await?;

    let cache_store: Arc<dyn CacheStore> = match &config.redis_url {
        Some(url) => match RedisCacheStore::connect(url).await {
            Ok(store) => {
                info!("user cache backed by redis");
                Arc::new(store)
            }
            Err(e) => {
                warn!(error = %e, "redis unavailable; using in-process user cache");
                Arc::new(MemoryCacheStore::new())
            }
        },
        None => {
            info!("REDIS_URL not set; using in-process user cache");
            Arc::new(MemoryCacheStore::new())
        }
    };

    let users = Arc::new(PgUserRepository::new(pool.clone()));
    let state = rolodex_api::AppState::new(
        pool,
        config.clone(),
        users,
        cache_store,
        Arc::new(LogEmailSender),
    );

    let app = rolodex_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
