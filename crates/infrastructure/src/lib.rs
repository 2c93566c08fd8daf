//! Infrastructure layer - adapters between the domain and the outside world
//!
//! PostgreSQL access through sqlx, Modbus transports over TCP and serial
//! lines, environment-driven settings, per-severity file logging and the
//! CSV configuration exchange.

pub mod database;
pub mod exchange;
pub mod logging;
pub mod settings;
pub mod transports;

pub use database::{ArchiveRepository, ArchiveRow, ConfigRepository, SchemaManager, UserRepository};
pub use logging::{LogGuards, LogSizes};
pub use settings::Settings;
pub use transports::{RtuLinkTransport, TcpLinkTransport, open_link_transport};
