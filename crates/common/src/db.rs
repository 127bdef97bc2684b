use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// How long to wait for a connection before giving up. The dispatch loop
/// ticks every few seconds; a pool that cannot hand out a connection within
/// this window is effectively down.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Create the PostgreSQL connection pool shared by the dispatch loop and the
/// API server. `max_connections` comes from `AppConfig::db_max_connections`.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await?;

    tracing::info!(max_connections, "Connected to PostgreSQL");
    Ok(pool)
}
