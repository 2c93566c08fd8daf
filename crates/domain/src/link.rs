use std::fmt;
use std::net::Ipv4Addr;

use crate::error::ConfigError;
use crate::record::HostLinkRecord;

/// Serial parity setting of a COM link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Even,
    Odd,
}

impl Parity {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "N" => Some(Self::None),
            "E" => Some(Self::Even),
            "O" => Some(Self::Odd),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "N",
            Self::Even => "E",
            Self::Odd => "O",
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// UART parameters of a COM link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialParams {
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: u8,
}

/// Transport flavor of a host link. The kind dictates which of the
/// persisted columns are meaningful; the other set is ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkKind {
    /// TCP egress: the local interface address the socket binds to.
    Tcp { address: Ipv4Addr, port: u16 },
    /// Serial egress: the persisted port column is a suffix appended to
    /// the platform device path prefix (e.g. `/dev/ttyUSB` + `0`).
    Com {
        port_suffix: String,
        serial: SerialParams,
    },
}

/// A physical egress point on the machine, shared by one or more devices.
#[derive(Debug, Clone, PartialEq)]
pub struct HostLink {
    pub name: String,
    pub kind: LinkKind,
}

impl HostLink {
    pub fn is_tcp(&self) -> bool {
        matches!(self.kind, LinkKind::Tcp { .. })
    }

    pub fn from_record(record: &HostLinkRecord) -> Result<Self, ConfigError> {
        let invalid = |field: &'static str, value: &str| ConfigError::InvalidLinkField {
            link: record.host.clone(),
            field,
            value: value.to_string(),
        };

        let kind = match record.contype.as_str() {
            "TCP" => {
                let address: Ipv4Addr = record
                    .address
                    .parse()
                    .map_err(|_| invalid("address", &record.address))?;
                let port: u16 = record.port.parse().map_err(|_| invalid("port", &record.port))?;
                LinkKind::Tcp { address, port }
            }
            "COM" => {
                let baud_rate: u32 = record
                    .baudrate
                    .parse()
                    .map_err(|_| invalid("baudrate", &record.baudrate))?;
                let data_bits: u8 = record
                    .databits
                    .parse()
                    .map_err(|_| invalid("databits", &record.databits))?;
                if !(5..=8).contains(&data_bits) {
                    return Err(invalid("databits", &record.databits));
                }
                let parity = Parity::from_name(&record.parity)
                    .ok_or_else(|| invalid("parity", &record.parity))?;
                let stop_bits: u8 = record
                    .stopbits
                    .parse()
                    .map_err(|_| invalid("stopbits", &record.stopbits))?;
                if !(1..=2).contains(&stop_bits) {
                    return Err(invalid("stopbits", &record.stopbits));
                }
                LinkKind::Com {
                    port_suffix: record.port.clone(),
                    serial: SerialParams {
                        baud_rate,
                        data_bits,
                        parity,
                        stop_bits,
                    },
                }
            }
            other => return Err(invalid("contype", other)),
        };

        Ok(Self {
            name: record.host.clone(),
            kind,
        })
    }

    pub fn to_record(&self) -> HostLinkRecord {
        match &self.kind {
            LinkKind::Tcp { address, port } => HostLinkRecord {
                host: self.name.clone(),
                contype: "TCP".to_string(),
                address: address.to_string(),
                port: port.to_string(),
                ..HostLinkRecord::default()
            },
            LinkKind::Com {
                port_suffix,
                serial,
            } => HostLinkRecord {
                host: self.name.clone(),
                contype: "COM".to_string(),
                address: String::new(),
                port: port_suffix.clone(),
                baudrate: serial.baud_rate.to_string(),
                databits: serial.data_bits.to_string(),
                parity: serial.parity.to_string(),
                stopbits: serial.stop_bits.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tcp_record() -> HostLinkRecord {
        HostLinkRecord {
            host: "Host1".to_string(),
            contype: "TCP".to_string(),
            address: "192.168.1.10".to_string(),
            port: "502".to_string(),
            ..HostLinkRecord::default()
        }
    }

    fn com_record() -> HostLinkRecord {
        HostLinkRecord {
            host: "Host2".to_string(),
            contype: "COM".to_string(),
            address: String::new(),
            port: "0".to_string(),
            baudrate: "9600".to_string(),
            databits: "8".to_string(),
            parity: "N".to_string(),
            stopbits: "1".to_string(),
        }
    }

    #[test]
    fn parses_tcp_link() {
        let link = HostLink::from_record(&tcp_record()).unwrap();
        assert!(link.is_tcp());
        match link.kind {
            LinkKind::Tcp { address, port } => {
                assert_eq!(address, Ipv4Addr::new(192, 168, 1, 10));
                assert_eq!(port, 502);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn parses_com_link() {
        let link = HostLink::from_record(&com_record()).unwrap();
        match link.kind {
            LinkKind::Com {
                port_suffix,
                serial,
            } => {
                assert_eq!(port_suffix, "0");
                assert_eq!(serial.baud_rate, 9600);
                assert_eq!(serial.parity, Parity::None);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn tcp_ignores_serial_columns() {
        let mut rec = tcp_record();
        rec.baudrate = "not-a-number".to_string();
        assert!(HostLink::from_record(&rec).is_ok());
    }

    #[test]
    fn rejects_malformed_ipv4() {
        let mut rec = tcp_record();
        rec.address = "192.168.1.256".to_string();
        assert!(matches!(
            HostLink::from_record(&rec),
            Err(ConfigError::InvalidLinkField { field: "address", .. })
        ));
    }

    #[test]
    fn rejects_unknown_parity() {
        let mut rec = com_record();
        rec.parity = "M".to_string();
        assert!(matches!(
            HostLink::from_record(&rec),
            Err(ConfigError::InvalidLinkField { field: "parity", .. })
        ));
    }

    #[test]
    fn rejects_unknown_connection_kind() {
        let mut rec = tcp_record();
        rec.contype = "UDP".to_string();
        assert!(HostLink::from_record(&rec).is_err());
    }
}
