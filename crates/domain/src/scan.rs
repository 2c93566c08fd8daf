use std::sync::Arc;
use std::time::Duration;

use crate::tag::{ByteFormat, DataType, FuncType, Tag};

/// One pre-resolved tag read. Built once at startup so the driver hot path
/// performs no name lookups and no string parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanItem {
    pub device: String,
    /// Sample name in the archive (the tag comment).
    pub name: String,
    /// Modbus unit id of the owning device, attached at enrichment time.
    pub unit_id: u8,
    pub address: u16,
    /// Register/coil count derived from the data type.
    pub count: u16,
    pub func: FuncType,
    pub data_type: DataType,
    pub format: ByteFormat,
    pub scan_period: Duration,
}

impl ScanItem {
    pub fn new(tag: &Tag, unit_id: u8) -> Self {
        Self {
            device: tag.device_name.clone(),
            name: if tag.comment.is_empty() {
                format!("{}@{}", tag.device_name, tag.address)
            } else {
                tag.comment.clone()
            },
            unit_id,
            address: tag.address,
            count: tag.data_type.register_count(),
            func: tag.func_type,
            data_type: tag.data_type,
            format: tag.format,
            scan_period: tag.scan_period,
        }
    }
}

/// The set of tag reads emitted in one scheduler tick. The item list is
/// shared: every tick of a period bucket emits the same set.
#[derive(Debug, Clone)]
pub struct ScanBatch {
    pub period: Duration,
    pub items: Arc<Vec<ScanItem>>,
}
