use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::info;

use domain::{DeviceRecord, HostLinkRecord, SystemConfig, TagRecord};

use crate::settings::Settings;

/// Read/write access to the three configuration tables. Rows are handled
/// as raw string records; typing and validation happen once in
/// [`SystemConfig::from_records`].
pub struct ConfigRepository {
    pool: PgPool,
    settings: Settings,
}

impl ConfigRepository {
    pub fn new(pool: PgPool, settings: Settings) -> Self {
        Self { pool, settings }
    }

    /// Loads and validates the full acquisition configuration. Any
    /// inconsistency is fatal to startup.
    pub async fn load(&self) -> Result<SystemConfig> {
        let (hosts, devices, tags) = self.read_records().await?;
        let config = SystemConfig::from_records(&hosts, &devices, &tags)
            .context("configuration validation failed")?;
        info!(
            links = config.links().len(),
            devices = config.devices().len(),
            tags = config.tags().len(),
            "configuration loaded"
        );
        Ok(config)
    }

    pub async fn read_records(
        &self,
    ) -> Result<(Vec<HostLinkRecord>, Vec<DeviceRecord>, Vec<TagRecord>)> {
        let query = format!(
            "SELECT host, contype, address, port, baudrate, databits, parity, stopbits \
             FROM {} ORDER BY id",
            self.settings.qualified(&self.settings.table_host)
        );
        let hosts = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .context("reading host table")?
            .into_iter()
            .map(|row| HostLinkRecord {
                host: row.get("host"),
                contype: row.get("contype"),
                address: row.get("address"),
                port: row.get("port"),
                baudrate: row.get("baudrate"),
                databits: row.get("databits"),
                parity: row.get("parity"),
                stopbits: row.get("stopbits"),
            })
            .collect();

        let query = format!(
            "SELECT device, comment, host, type, address, ip, port FROM {} ORDER BY id",
            self.settings.qualified(&self.settings.table_devices)
        );
        let devices = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .context("reading devices table")?
            .into_iter()
            .map(|row| DeviceRecord {
                device: row.get("device"),
                comment: row.get("comment"),
                host: row.get("host"),
                protocol: row.get("type"),
                address: row.get("address"),
                ip: row.get("ip"),
                port: row.get("port"),
            })
            .collect();

        let query = format!(
            "SELECT device, address, datatype, comment, timescan, functype, format \
             FROM {} ORDER BY id",
            self.settings.qualified(&self.settings.table_tags)
        );
        let tags = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .context("reading tags table")?
            .into_iter()
            .map(|row| TagRecord {
                device: row.get("device"),
                address: row.get("address"),
                datatype: row.get("datatype"),
                comment: row.get("comment"),
                timescan: row.get("timescan"),
                functype: row.get("functype"),
                format: row.get("format"),
            })
            .collect();

        Ok((hosts, devices, tags))
    }

    /// Inserts imported configuration rows, in exchange-file order.
    pub async fn insert_records(
        &self,
        hosts: &[HostLinkRecord],
        devices: &[DeviceRecord],
        tags: &[TagRecord],
    ) -> Result<()> {
        for host in hosts {
            let query = format!(
                "INSERT INTO {} (host, contype, address, port, baudrate, databits, parity, stopbits) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
                self.settings.qualified(&self.settings.table_host)
            );
            sqlx::query(&query)
                .bind(&host.host)
                .bind(&host.contype)
                .bind(&host.address)
                .bind(&host.port)
                .bind(&host.baudrate)
                .bind(&host.databits)
                .bind(&host.parity)
                .bind(&host.stopbits)
                .execute(&self.pool)
                .await
                .with_context(|| format!("inserting host link row `{}`", host.host))?;
        }

        for device in devices {
            let query = format!(
                "INSERT INTO {} (device, comment, host, type, address, ip, port) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
                self.settings.qualified(&self.settings.table_devices)
            );
            sqlx::query(&query)
                .bind(&device.device)
                .bind(&device.comment)
                .bind(&device.host)
                .bind(&device.protocol)
                .bind(&device.address)
                .bind(&device.ip)
                .bind(&device.port)
                .execute(&self.pool)
                .await
                .with_context(|| format!("inserting device row `{}`", device.device))?;
        }

        for tag in tags {
            let query = format!(
                "INSERT INTO {} (device, address, datatype, comment, timescan, functype, format) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
                self.settings.qualified(&self.settings.table_tags)
            );
            sqlx::query(&query)
                .bind(&tag.device)
                .bind(&tag.address)
                .bind(&tag.datatype)
                .bind(&tag.comment)
                .bind(&tag.timescan)
                .bind(&tag.functype)
                .bind(&tag.format)
                .execute(&self.pool)
                .await
                .with_context(|| format!("inserting tag row `{}/{}`", tag.device, tag.address))?;
        }

        info!(
            hosts = hosts.len(),
            devices = devices.len(),
            tags = tags.len(),
            "configuration rows imported"
        );
        Ok(())
    }
}
