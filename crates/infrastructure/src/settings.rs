use std::path::PathBuf;

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Process settings, read once at startup from the environment (usually
/// seeded by a `.env` file). Values are threaded through constructors;
/// nothing reads the environment after startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub db_host: String,
    pub db_host_port: String,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
    pub db_sslmode: String,

    pub table_schema: String,
    pub table_host: String,
    pub table_devices: String,
    pub table_tags: String,
    pub table_data: String,
    pub table_users: String,

    pub log_path: String,
    pub com_port_path: String,

    pub http_server_ip: String,
    pub http_server_port: String,
    pub https_server_ip: String,
    pub https_server_port: String,
    pub https_server_key_public: String,
    pub https_server_key_private: String,
    pub https_server_use: String,

    pub import_file_name: String,
    pub export_file_path: String,
    pub export_file_name: String,
    pub export_file_type: String,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let source = Config::builder()
            .set_default("db_host", "localhost")?
            .set_default("db_host_port", "5432")?
            .set_default("db_user", "postgres")?
            .set_default("db_password", "postgres")?
            .set_default("db_name", "blackbox")?
            .set_default("db_sslmode", "disable")?
            .set_default("table_schema", "public")?
            .set_default("table_host", "host")?
            .set_default("table_devices", "devices")?
            .set_default("table_tags", "tags")?
            .set_default("table_data", "data")?
            .set_default("table_users", "users")?
            .set_default("log_path", "./logs/")?
            .set_default("com_port_path", "/dev/ttyUSB")?
            .set_default("http_server_ip", "127.0.0.1")?
            .set_default("http_server_port", "8080")?
            .set_default("https_server_ip", "0.0.0.0")?
            .set_default("https_server_port", "8443")?
            .set_default("https_server_key_public", "./certs/server.crt")?
            .set_default("https_server_key_private", "./certs/server.key")?
            .set_default("https_server_use", "false")?
            .set_default("import_file_name", "./configs/config.csv")?
            .set_default("export_file_path", "./export/")?
            .set_default("export_file_name", "config-export")?
            .set_default("export_file_type", "csv")?
            .add_source(Environment::default())
            .build()?;

        source.try_deserialize()
    }

    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.db_user,
            self.db_password,
            self.db_host,
            self.db_host_port,
            self.db_name,
            self.db_sslmode
        )
    }

    /// Schema-qualified table name for SQL text. Table names come from the
    /// environment, so statements are assembled at runtime.
    pub fn qualified(&self, table: &str) -> String {
        format!("{}.{}", self.table_schema, table)
    }

    pub fn http_bind(&self) -> String {
        format!("{}:{}", self.http_server_ip, self.http_server_port)
    }

    pub fn https_bind(&self) -> String {
        format!("{}:{}", self.https_server_ip, self.https_server_port)
    }

    pub fn use_https(&self) -> bool {
        self.https_server_use.eq_ignore_ascii_case("true")
    }

    /// Full serial device path for a COM link: platform prefix plus the
    /// persisted port suffix.
    pub fn com_port_device(&self, suffix: &str) -> String {
        format!("{}{}", self.com_port_path, suffix)
    }

    pub fn import_file(&self) -> PathBuf {
        PathBuf::from(&self.import_file_name)
    }

    pub fn export_file_basename(&self) -> String {
        format!("{}.{}", self.export_file_name, self.export_file_type)
    }

    pub fn export_file(&self, stamp: &str) -> PathBuf {
        PathBuf::from(&self.export_file_path).join(format!(
            "{}-{}.{}",
            self.export_file_name, stamp, self.export_file_type
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_key() {
        let settings = Settings::load().unwrap();
        assert_eq!(settings.table_data, "data");
        assert!(settings.database_url().starts_with("postgres://"));
        assert_eq!(settings.qualified("data"), "public.data");
        assert_eq!(settings.com_port_device("0"), "/dev/ttyUSB0");
        assert!(!settings.use_https());
    }
}
