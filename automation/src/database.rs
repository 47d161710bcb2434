// Postgres pool and migrations for the automation tables

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::PoolConfig;

/// Open a connection pool sized by `pool`. The pool backs
/// [`PgAutomationStore`](crate::store::PgAutomationStore).
pub async fn create_pool(database_url: &str, pool: &PoolConfig) -> anyhow::Result<PgPool> {
    let db_pool = PgPoolOptions::new()
        .max_connections(pool.max_connections)
        .min_connections(pool.min_connections)
        .acquire_timeout(pool.acquire_timeout)
        .connect(database_url)
        .await?;

    tracing::info!(
        "Automation store pool created: max={}, min={}",
        pool.max_connections,
        pool.min_connections
    );

    Ok(db_pool)
}

/// Run the embedded migrations for automation_rules, webhook_subscriptions
/// and notifications.
pub async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Automation migrations completed");
    Ok(())
}

/// Check database health
pub async fn health_check(pool: &PgPool) -> bool {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .is_ok()
}
