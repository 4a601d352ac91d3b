//! PostgreSQL connection pool setup.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Default number of pooled connections.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// How long a request waits for a free connection before failing.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Open a connection pool against `url`.
///
/// Connections are handed out per request; nothing holds one across
/// requests.
pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    log::info!("Connecting to PostgreSQL (max_connections={max_connections})");
    let pool = PgPoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(url)
        .await?;
    log::info!("PostgreSQL pool ready");
    Ok(pool)
}

/// Returns `true` when the database answers a trivial query.
pub async fn ping(pool: &PgPool) -> bool {
    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await {
        Ok(_) => true,
        Err(e) => {
            log::warn!("Database ping failed: {e}");
            false
        }
    }
}
