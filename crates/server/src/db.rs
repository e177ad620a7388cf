use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

use cidvault_core::config::PostgresConfig;

/// Create a PostgreSQL connection pool and run migrations.
/// Returns None if DATABASE_URL is not configured.
pub async fn init_pg_pool(config: &PostgresConfig) -> anyhow::Result<Option<PgPool>> {
    let Some(url) = config.database_url.as_deref() else {
        warn!("DATABASE_URL not configured, metadata will be kept in memory only");
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(url)
        .await
        .context("failed to connect to PostgreSQL")?;
    info!("PostgreSQL connected (max_connections={})", config.max_connections);

    run_migrations(&pool).await?;
    Ok(Some(pool))
}

pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .context("failed to run database migrations")?;
    info!("Database migrations applied successfully");
    Ok(())
}
