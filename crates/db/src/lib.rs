//! PostgreSQL connection pool factory and table bootstrap.

use std::time::Duration;

use anyhow::Context;
use bookstore_kernel::settings::DatabaseSettings;
use bookstore_kernel::Migration;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Open a connection pool and verify the database answers.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<PgPool> {
    tracing::info!(
        target: "bookstore-db",
        url = %settings.redacted_url(),
        max_connections = settings.max_connections,
        "connecting to database"
    );

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_millis(settings.acquire_timeout_ms))
        .connect(&settings.url)
        .await
        .with_context(|| format!("failed to connect to {}", settings.redacted_url()))?;

    ping(&pool).await?;

    Ok(pool)
}

/// Round-trip a trivial query through the pool.
pub async fn ping(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .context("database ping failed")?;
    Ok(())
}

/// Run every module's bootstrap statements in the given order.
///
/// Statements are expected to be idempotent; nothing records which ones ran.
pub async fn apply_migrations(
    pool: &PgPool,
    migrations: &[(String, Migration)],
) -> anyhow::Result<()> {
    for (module, migration) in migrations {
        tracing::info!(
            target: "bookstore-db",
            module = %module,
            migration = migration.id,
            "applying table bootstrap"
        );

        sqlx::raw_sql(migration.up)
            .execute(pool)
            .await
            .with_context(|| format!("bootstrap '{}' of module '{}' failed", migration.id, module))?;
    }

    Ok(())
}
