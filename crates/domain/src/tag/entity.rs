use std::time::Duration;

use crate::error::ConfigError;
use crate::record::TagRecord;

use super::{ByteFormat, DataType, FuncType};

/// A scalar register mapped to a typed value stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub device_name: String,
    pub address: u16,
    pub data_type: DataType,
    pub func_type: FuncType,
    pub scan_period: Duration,
    pub format: ByteFormat,
    /// Human label; becomes the sample `name` in the archive.
    pub comment: String,
}

impl Tag {
    /// Parses and validates a persisted tag row. Cross-references to the
    /// device table are checked separately by [`crate::SystemConfig`].
    pub fn from_record(record: &TagRecord) -> Result<Self, ConfigError> {
        let label = if record.comment.is_empty() {
            format!("{}@{}", record.device, record.address)
        } else {
            record.comment.clone()
        };
        let invalid = |field: &'static str, value: &str| ConfigError::InvalidTagField {
            tag: label.clone(),
            field,
            value: value.to_string(),
        };

        let address: u16 = record
            .address
            .parse()
            .map_err(|_| invalid("address", &record.address))?;

        let data_type = DataType::from_name(&record.datatype)
            .ok_or_else(|| invalid("datatype", &record.datatype))?;

        let func_type = FuncType::from_name(&record.functype)
            .ok_or_else(|| invalid("functype", &record.functype))?;

        let period_ms: u64 = record
            .timescan
            .parse()
            .map_err(|_| invalid("timescan", &record.timescan))?;
        if period_ms == 0 {
            return Err(invalid("timescan", &record.timescan));
        }

        let format = ByteFormat::parse(&record.format, data_type.byte_width())
            .map_err(|_| invalid("format", &record.format))?;

        if !func_type.permits(data_type) {
            return Err(ConfigError::IncompatibleFunction {
                tag: label,
                func: func_type.to_string(),
                data_type: data_type.to_string(),
            });
        }

        // Writes have no configured value source; they never belong on the
        // cyclic scan path.
        if !func_type.is_read() {
            return Err(ConfigError::UnschedulableFunction {
                tag: label,
                func: func_type.to_string(),
            });
        }

        Ok(Self {
            device_name: record.device.clone(),
            address,
            data_type,
            func_type,
            scan_period: Duration::from_millis(period_ms),
            format,
            comment: record.comment.clone(),
        })
    }

    pub fn to_record(&self) -> TagRecord {
        TagRecord {
            device: self.device_name.clone(),
            address: self.address.to_string(),
            datatype: self.data_type.as_str().to_string(),
            comment: self.comment.clone(),
            timescan: self.scan_period.as_millis().to_string(),
            functype: self.func_type.as_str().to_string(),
            format: self.format.to_string(),
        }
    }
}
