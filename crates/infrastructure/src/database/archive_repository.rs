use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use domain::{ArchiveSink, Sample, StoreError};

use crate::settings::Settings;

/// One archived row as served to HTTP clients. Values are delivered as
/// text; NUMERIC precision is preserved end to end.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveRow {
    pub name: String,
    pub value: String,
    pub qual: String,
    pub timestamp: String,
}

/// The archive table. Writes come exclusively from the sink worker; reads
/// come from the HTTP surface.
#[derive(Clone)]
pub struct ArchiveRepository {
    pool: PgPool,
    table: String,
}

impl ArchiveRepository {
    pub fn new(pool: PgPool, settings: &Settings) -> Self {
        Self {
            pool,
            table: settings.qualified(&settings.table_data),
        }
    }

    pub async fn count_for_date(&self, date: NaiveDate) -> Result<i64> {
        let query = format!(
            "SELECT COUNT(*) FROM {} WHERE timestamp::date = $1",
            self.table
        );
        let row = sqlx::query(&query)
            .bind(date)
            .fetch_one(&self.pool)
            .await
            .context("counting archive rows")?;
        Ok(row.get::<i64, _>(0))
    }

    /// One page of a day's archive, oldest first (the export ordering).
    pub async fn page_for_date(
        &self,
        date: NaiveDate,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ArchiveRow>> {
        let query = format!(
            "SELECT name, value::text AS value, qual::text AS qual, timestamp::text AS ts \
             FROM {} WHERE timestamp::date = $1 ORDER BY timestamp ASC LIMIT $2 OFFSET $3",
            self.table
        );
        let rows = sqlx::query(&query)
            .bind(date)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .context("reading archive page")?;

        Ok(rows.into_iter().map(Self::map_row).collect())
    }

    /// Every row of a day's archive, oldest first (the export ordering).
    pub async fn rows_for_date_asc(&self, date: NaiveDate) -> Result<Vec<ArchiveRow>> {
        let query = format!(
            "SELECT name, value::text AS value, qual::text AS qual, timestamp::text AS ts \
             FROM {} WHERE timestamp::date = $1 ORDER BY timestamp ASC",
            self.table
        );
        let rows = sqlx::query(&query)
            .bind(date)
            .fetch_all(&self.pool)
            .await
            .context("reading archive rows")?;

        Ok(rows.into_iter().map(Self::map_row).collect())
    }

    /// Every row of a day's archive, newest first (the preview ordering).
    pub async fn rows_for_date_desc(&self, date: NaiveDate) -> Result<Vec<ArchiveRow>> {
        let query = format!(
            "SELECT name, value::text AS value, qual::text AS qual, timestamp::text AS ts \
             FROM {} WHERE timestamp::date = $1 ORDER BY timestamp DESC",
            self.table
        );
        let rows = sqlx::query(&query)
            .bind(date)
            .fetch_all(&self.pool)
            .await
            .context("reading archive rows")?;

        Ok(rows.into_iter().map(Self::map_row).collect())
    }

    fn map_row(row: sqlx::postgres::PgRow) -> ArchiveRow {
        ArchiveRow {
            name: row.get("name"),
            value: row.get("value"),
            qual: row.get("qual"),
            timestamp: row.get("ts"),
        }
    }
}

#[async_trait]
impl ArchiveSink for ArchiveRepository {
    async fn store_batch(&self, samples: &[Sample]) -> Result<(), StoreError> {
        if samples.is_empty() {
            return Ok(());
        }

        // One multi-row insert per batch; timestamps are assigned by the
        // server clock, values travel as text and are coerced to NUMERIC
        // without narrowing 64-bit integers through a float.
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("INSERT INTO {} (dev, name, value, qual) ", self.table));
        builder.push_values(samples, |mut row, sample| {
            row.push_bind(&sample.device)
                .push_bind(&sample.name)
                .push_bind(sample.value.to_string())
                .push_unseparated("::numeric")
                .push_bind(i32::from(sample.quality.as_i16()));
        });

        builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError(e.to_string()))?;

        Ok(())
    }
}
