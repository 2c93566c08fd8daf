use serde::{Deserialize, Serialize};

/// Raw row of the host table, exactly as persisted or exchanged.
/// All fields are strings; [`crate::SystemConfig::from_records`] is the
/// single place they are parsed into typed values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostLinkRecord {
    pub host: String,
    pub contype: String,
    pub address: String,
    pub port: String,
    pub baudrate: String,
    pub databits: String,
    pub parity: String,
    pub stopbits: String,
}

/// Raw row of the devices table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub device: String,
    pub comment: String,
    pub host: String,
    #[serde(rename = "type")]
    pub protocol: String,
    pub address: String,
    pub ip: String,
    pub port: String,
}

/// Raw row of the tags table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagRecord {
    pub device: String,
    pub address: String,
    pub datatype: String,
    pub comment: String,
    pub timescan: String,
    pub functype: String,
    pub format: String,
}
