mod archive_repository;
mod config_repository;
mod schema;
mod user_repository;

pub use archive_repository::{ArchiveRepository, ArchiveRow};
pub use config_repository::ConfigRepository;
pub use schema::SchemaManager;
pub use user_repository::UserRepository;

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::settings::Settings;

/// Opens the PostgreSQL pool and verifies the connection with a ping.
pub async fn connect(settings: &Settings) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&settings.database_url())
        .await
        .context("connecting to the database")?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .context("pinging the database")?;

    Ok(pool)
}
