use std::fmt;
use std::net::Ipv4Addr;

use crate::error::ConfigError;
use crate::record::DeviceRecord;

/// Protocol spoken to a device. Must agree with the kind of the host link
/// the device is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    ModbusTcp,
    ModbusRtu,
}

impl Protocol {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Modbus-TCP" => Some(Self::ModbusTcp),
            "Modbus-RTU" => Some(Self::ModbusRtu),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModbusTcp => "Modbus-TCP",
            Self::ModbusRtu => "Modbus-RTU",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A logical Modbus slave bound to exactly one host link.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub name: String,
    pub comment: String,
    pub host_name: String,
    pub protocol: Protocol,
    /// Modbus unit id, 1..=247.
    pub unit_id: u8,
    /// Gateway endpoint; present iff the protocol is Modbus-TCP.
    pub endpoint: Option<(Ipv4Addr, u16)>,
}

impl Device {
    pub fn from_record(record: &DeviceRecord) -> Result<Self, ConfigError> {
        let invalid = |field: &'static str, value: &str| ConfigError::InvalidDeviceField {
            device: record.device.clone(),
            field,
            value: value.to_string(),
        };

        let protocol = Protocol::from_name(&record.protocol)
            .ok_or_else(|| invalid("type", &record.protocol))?;

        let unit_id: u8 = record
            .address
            .parse()
            .map_err(|_| invalid("address", &record.address))?;
        if !(1..=247).contains(&unit_id) {
            return Err(invalid("address", &record.address));
        }

        let endpoint = match protocol {
            Protocol::ModbusTcp => {
                let ip: Ipv4Addr = record.ip.parse().map_err(|_| invalid("ip", &record.ip))?;
                let port: u16 = record.port.parse().map_err(|_| invalid("port", &record.port))?;
                Some((ip, port))
            }
            Protocol::ModbusRtu => None,
        };

        Ok(Self {
            name: record.device.clone(),
            comment: record.comment.clone(),
            host_name: record.host.clone(),
            protocol,
            unit_id,
            endpoint,
        })
    }

    pub fn to_record(&self) -> DeviceRecord {
        let (ip, port) = match self.endpoint {
            Some((ip, port)) => (ip.to_string(), port.to_string()),
            None => (String::new(), String::new()),
        };
        DeviceRecord {
            device: self.name.clone(),
            comment: self.comment.clone(),
            host: self.host_name.clone(),
            protocol: self.protocol.as_str().to_string(),
            address: self.unit_id.to_string(),
            ip,
            port,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tcp_record() -> DeviceRecord {
        DeviceRecord {
            device: "Dev1".to_string(),
            comment: "gateway slave".to_string(),
            host: "Host1".to_string(),
            protocol: "Modbus-TCP".to_string(),
            address: "17".to_string(),
            ip: "10.0.0.5".to_string(),
            port: "502".to_string(),
        }
    }

    #[test]
    fn parses_tcp_device() {
        let dev = Device::from_record(&tcp_record()).unwrap();
        assert_eq!(dev.unit_id, 17);
        assert_eq!(dev.endpoint, Some((Ipv4Addr::new(10, 0, 0, 5), 502)));
    }

    #[test]
    fn rtu_device_has_no_endpoint() {
        let mut rec = tcp_record();
        rec.protocol = "Modbus-RTU".to_string();
        rec.ip = String::new();
        rec.port = String::new();
        let dev = Device::from_record(&rec).unwrap();
        assert_eq!(dev.endpoint, None);
    }

    #[test]
    fn rejects_unit_id_out_of_range() {
        for bad in ["0", "248", "300", "abc"] {
            let mut rec = tcp_record();
            rec.address = bad.to_string();
            assert!(
                Device::from_record(&rec).is_err(),
                "unit id `{bad}` must be rejected"
            );
        }
    }

    #[test]
    fn rejects_bad_slave_endpoint() {
        let mut rec = tcp_record();
        rec.ip = "10.0.0".to_string();
        assert!(matches!(
            Device::from_record(&rec),
            Err(ConfigError::InvalidDeviceField { field: "ip", .. })
        ));
    }
}
