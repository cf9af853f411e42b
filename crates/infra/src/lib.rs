//! Infrastructure layer: persistence, lifecycle engines, configuration.
//!
//! - `store`: `ShiftStore` / `AssignmentStore` traits with in-memory and Postgres backends
//! - `lifecycle`: the engines that validate, apply transition rules and persist
//! - `config` + `services`: env-driven wiring of engines over a chosen backend

pub mod config;
pub mod lifecycle;
pub mod services;
pub mod store;


/// Embedded schema migrations (`crates/infra/migrations`).
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Apply pending schema migrations.
pub async fn migrate(pool: &sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}
