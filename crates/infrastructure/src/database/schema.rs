use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::info;

use crate::settings::Settings;

/// Administration of the five persisted tables: existence checks, creation
/// and truncation of the configuration set.
pub struct SchemaManager {
    pool: PgPool,
    settings: Settings,
}

impl SchemaManager {
    pub fn new(pool: PgPool, settings: Settings) -> Self {
        Self { pool, settings }
    }

    async fn table_exists(&self, table: &str) -> Result<bool> {
        let row = sqlx::query(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
             WHERE table_schema = $1 AND table_name = $2)",
        )
        .bind(&self.settings.table_schema)
        .bind(table)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("checking table {table}"))?;

        Ok(row.get::<bool, _>(0))
    }

    /// True when every required table is present.
    pub async fn tables_exist(&self) -> Result<bool> {
        for table in [
            &self.settings.table_host,
            &self.settings.table_devices,
            &self.settings.table_tags,
            &self.settings.table_data,
            &self.settings.table_users,
        ] {
            if !self.table_exists(table).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub async fn create_tables(&self) -> Result<()> {
        let statements = [
            format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id SERIAL PRIMARY KEY NOT NULL,
                    host VARCHAR(50) NOT NULL,
                    contype VARCHAR(50) NOT NULL,
                    address VARCHAR(50) NOT NULL,
                    port VARCHAR(50) NOT NULL,
                    baudrate VARCHAR(7),
                    databits VARCHAR(3),
                    parity VARCHAR(5),
                    stopbits VARCHAR(3),
                    timestamp TIMESTAMPTZ DEFAULT NOW()
                )",
                self.settings.qualified(&self.settings.table_host)
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id SERIAL PRIMARY KEY NOT NULL,
                    device VARCHAR(50) NOT NULL,
                    comment VARCHAR(50) NOT NULL,
                    host VARCHAR(50) NOT NULL,
                    type VARCHAR(50) NOT NULL,
                    address VARCHAR(5) NOT NULL,
                    ip VARCHAR(15) NOT NULL,
                    port VARCHAR(5) NOT NULL,
                    timestamp TIMESTAMPTZ DEFAULT NOW()
                )",
                self.settings.qualified(&self.settings.table_devices)
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id SERIAL PRIMARY KEY NOT NULL,
                    device VARCHAR(50) NOT NULL,
                    address VARCHAR(50) NOT NULL,
                    datatype VARCHAR(50) NOT NULL,
                    comment VARCHAR(100) NOT NULL,
                    timescan VARCHAR(30) NOT NULL,
                    functype VARCHAR(30) NOT NULL,
                    format VARCHAR(30) NOT NULL,
                    timestamp TIMESTAMPTZ DEFAULT NOW()
                )",
                self.settings.qualified(&self.settings.table_tags)
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id SERIAL PRIMARY KEY NOT NULL,
                    dev VARCHAR(50) NOT NULL,
                    name VARCHAR(50) NOT NULL,
                    value NUMERIC NOT NULL,
                    qual NUMERIC NOT NULL,
                    timestamp TIMESTAMPTZ DEFAULT NOW()
                )",
                self.settings.qualified(&self.settings.table_data)
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id SERIAL PRIMARY KEY NOT NULL,
                    name VARCHAR(50) UNIQUE NOT NULL,
                    password VARCHAR(64) NOT NULL,
                    token VARCHAR(64) NOT NULL,
                    timestamp TIMESTAMPTZ DEFAULT NOW()
                )",
                self.settings.qualified(&self.settings.table_users)
            ),
        ];

        for statement in &statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("creating table")?;
        }

        info!("database tables created");
        Ok(())
    }

    /// Empties the three configuration tables. Archive and user tables are
    /// left untouched.
    pub async fn truncate_config_tables(&self) -> Result<()> {
        for table in [
            &self.settings.table_host,
            &self.settings.table_devices,
            &self.settings.table_tags,
        ] {
            let statement = format!("TRUNCATE TABLE {}", self.settings.qualified(table));
            sqlx::query(&statement)
                .execute(&self.pool)
                .await
                .with_context(|| format!("truncating table {table}"))?;
        }

        info!("configuration tables truncated");
        Ok(())
    }
}
