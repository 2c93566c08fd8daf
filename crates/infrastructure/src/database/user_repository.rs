use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::info;

use crate::settings::Settings;

/// The users table. Read-mostly: the login handler updates tokens, the
/// administration tooling manages accounts, nothing else writes.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
    table: String,
}

impl UserRepository {
    pub fn new(pool: PgPool, settings: &Settings) -> Self {
        Self {
            pool,
            table: settings.qualified(&settings.table_users),
        }
    }

    /// Stored password hash, or `None` for an unknown user.
    pub async fn password_hash(&self, name: &str) -> Result<Option<String>> {
        let query = format!("SELECT password FROM {} WHERE name = $1", self.table);
        let row = sqlx::query(&query)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("reading user password hash")?;
        Ok(row.map(|r| r.get("password")))
    }

    /// Stored session token, or `None` for an unknown user.
    pub async fn token(&self, name: &str) -> Result<Option<String>> {
        let query = format!("SELECT token FROM {} WHERE name = $1", self.table);
        let row = sqlx::query(&query)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("reading user token")?;
        Ok(row.map(|r| r.get("token")))
    }

    pub async fn save_token(&self, name: &str, token: &str) -> Result<()> {
        let query = format!("UPDATE {} SET token = $1 WHERE name = $2", self.table);
        sqlx::query(&query)
            .bind(token)
            .bind(name)
            .execute(&self.pool)
            .await
            .context("saving user token")?;
        Ok(())
    }

    /// Seeds the administration account with an empty password hash. Logins
    /// stay rejected until an administrator sets a real password.
    pub async fn seed_admin(&self) -> Result<()> {
        let query = format!(
            "INSERT INTO {} (name, password, token) VALUES ($1, '', '') \
             ON CONFLICT (name) DO NOTHING",
            self.table
        );
        sqlx::query(&query)
            .bind("admin")
            .execute(&self.pool)
            .await
            .context("seeding admin user")?;
        info!("admin user present");
        Ok(())
    }
}
