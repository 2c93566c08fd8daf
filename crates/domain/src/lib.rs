//! Domain layer - Pure business logic with no external dependencies
//!
//! This crate contains:
//! - Entities (HostLink, Device, Tag)
//! - Value Objects (DataType, FuncType, ByteFormat, ScalarValue)
//! - The wire-value decoder
//! - Port interfaces (LinkTransport, ArchiveSink)
//!
//! Principles:
//! - No dependencies on infrastructure
//! - Configuration is parsed and validated exactly once, here
//! - Typed values flow through the pipeline; no string re-parsing in hot paths

pub mod archive;
pub mod config;
pub mod decode;
pub mod device;
pub mod error;
pub mod link;
pub mod record;
pub mod sample;
pub mod scan;
pub mod tag;
pub mod transport;

// Re-export commonly used types
pub use archive::ArchiveSink;
pub use config::SystemConfig;
pub use decode::{RawPayload, decode_value};
pub use device::{Device, Protocol};
pub use error::{ConfigError, DecodeError, StoreError, TransportError};
pub use link::{HostLink, LinkKind, Parity, SerialParams};
pub use record::{DeviceRecord, HostLinkRecord, TagRecord};
pub use sample::{Quality, Sample, ScalarValue};
pub use scan::{ScanBatch, ScanItem};
pub use tag::{ByteFormat, DataType, FuncType, Tag};
pub use transport::LinkTransport;
