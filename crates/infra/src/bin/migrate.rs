//! Apply the schema migrations to the configured database.
//!
//! Reads `DATABASE_URL` (or the `DB_*` variables) and exits non-zero on failure.

use anyhow::Context;
use tracing::info;

use sitesecurity_infra::config::DatabaseConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sitesecurity_observability::init();

    let config = DatabaseConfig::from_env().context("invalid database configuration")?;
    let pool = config
        .connect()
        .await
        .context("failed to connect to Postgres")?;

    sitesecurity_infra::migrate(&pool)
        .await
        .context("failed to apply migrations")?;

    info!(
        migrations = sitesecurity_infra::MIGRATOR.iter().count(),
        "database schema is up to date"
    );
    pool.close().await;
    Ok(())
}
