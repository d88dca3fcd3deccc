use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::info;

use crate::config::DbConfig;
use crate::queries::plants;

/// Embedded `plants` schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

async fn connect(url: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(url)
        .await
        .with_context(|| format!("failed to connect to database at {url}"))
}

/// Pool for the plant store.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    connect(&config.database_url, 5).await
}

/// Bring the `plants` table up to the latest schema.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to migrate the plants schema")?;

    info!(migrations = MIGRATOR.iter().count(), "plants schema up to date");
    Ok(())
}

/// `CREATE DATABASE` cannot bind its name, so only plain identifiers are
/// accepted.
fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Create the greenhouse database through the `postgres` maintenance
/// database unless it already exists.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<()> {
    let db_name = config
        .database_name()
        .context("database URL has no database name")?;
    if !is_plain_identifier(db_name) {
        anyhow::bail!("database name {db_name:?} must be letters, digits and underscores");
    }

    let maint_pool = connect(&config.maintenance_url(), 1).await?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(db_name)
            .fetch_one(&maint_pool)
            .await
            .context("failed to query pg_database")?;

    if !exists {
        maint_pool
            .execute(format!("CREATE DATABASE {db_name}").as_str())
            .await
            .with_context(|| format!("failed to create database {db_name}"))?;
        info!(db = db_name, "database created");
    }

    maint_pool.close().await;
    Ok(())
}

/// State of a freshly initialized plant database, reported by
/// `greenhouse db-init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantDbStatus {
    pub migrations: usize,
    pub plants: i64,
}

pub async fn plant_db_status(pool: &PgPool) -> Result<PlantDbStatus> {
    Ok(PlantDbStatus {
        migrations: MIGRATOR.iter().count(),
        plants: plants::count_plants(pool).await?,
    })
}
