use serde::Serialize;
use tokio::sync::Mutex;

use domain::{LinkKind, SystemConfig};
use infrastructure::{ArchiveRepository, Settings, UserRepository};

/// Serial-line parameters of a COM link as shown by `/status`.
#[derive(Debug, Clone, Serialize)]
pub struct RtuParams {
    #[serde(rename = "BaudRate")]
    pub baud_rate: u32,
    #[serde(rename = "DataBits")]
    pub data_bits: u8,
    #[serde(rename = "Parity")]
    pub parity: String,
    #[serde(rename = "StopBits")]
    pub stop_bits: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct RtuLinkInfo {
    #[serde(rename = "ConName")]
    pub con_name: String,
    #[serde(rename = "Con")]
    pub con: String,
    #[serde(rename = "ConParams")]
    pub params: RtuParams,
}

#[derive(Debug, Clone, Serialize)]
pub struct TcpLinkInfo {
    #[serde(rename = "ConName")]
    pub con_name: String,
    #[serde(rename = "Con")]
    pub con: String,
}

/// Static link inventory shown by the status endpoints, derived from the
/// validated configuration at boot.
#[derive(Debug, Clone, Default)]
pub struct LinkInventory {
    pub rtu: Vec<RtuLinkInfo>,
    pub tcp: Vec<TcpLinkInfo>,
}

impl LinkInventory {
    pub fn from_config(config: &SystemConfig, settings: &Settings) -> Self {
        let mut inventory = Self::default();
        for link in config.links() {
            match &link.kind {
                LinkKind::Tcp { address, .. } => inventory.tcp.push(TcpLinkInfo {
                    con_name: link.name.clone(),
                    con: address.to_string(),
                }),
                LinkKind::Com {
                    port_suffix,
                    serial,
                } => inventory.rtu.push(RtuLinkInfo {
                    con_name: link.name.clone(),
                    con: settings.com_port_device(port_suffix),
                    params: RtuParams {
                        baud_rate: serial.baud_rate,
                        data_bits: serial.data_bits,
                        parity: serial.parity.to_string(),
                        stop_bits: serial.stop_bits,
                    },
                }),
            }
        }
        inventory
    }
}

/// Shared state of both HTTP surfaces.
pub struct AppState {
    /// Boot time, preformatted for the status payload.
    pub started_at: String,
    pub links: LinkInventory,
    pub settings: Settings,
    pub archive: ArchiveRepository,
    pub users: UserRepository,
    /// Process-wide serialization of handlers: at most one request works
    /// at a time, bounding handler-local resource use during large
    /// exports.
    pub gate: Mutex<()>,
}

impl AppState {
    pub fn new(
        started_at: String,
        links: LinkInventory,
        settings: Settings,
        archive: ArchiveRepository,
        users: UserRepository,
    ) -> Self {
        Self {
            started_at,
            links,
            settings,
            archive,
            users,
            gate: Mutex::new(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{DeviceRecord, HostLinkRecord};

    #[test]
    fn inventory_splits_links_by_kind() {
        let hosts = vec![
            HostLinkRecord {
                host: "Host1".to_string(),
                contype: "TCP".to_string(),
                address: "192.168.1.10".to_string(),
                port: "502".to_string(),
                ..HostLinkRecord::default()
            },
            HostLinkRecord {
                host: "Host2".to_string(),
                contype: "COM".to_string(),
                port: "0".to_string(),
                baudrate: "19200".to_string(),
                databits: "8".to_string(),
                parity: "E".to_string(),
                stopbits: "1".to_string(),
                ..HostLinkRecord::default()
            },
        ];
        let devices = vec![DeviceRecord {
            device: "Dev1".to_string(),
            comment: String::new(),
            host: "Host1".to_string(),
            protocol: "Modbus-TCP".to_string(),
            address: "1".to_string(),
            ip: "10.0.0.5".to_string(),
            port: "502".to_string(),
        }];
        let config = SystemConfig::from_records(&hosts, &devices, &[]).unwrap();
        let settings = Settings::load().unwrap();

        let inventory = LinkInventory::from_config(&config, &settings);
        assert_eq!(inventory.tcp.len(), 1);
        assert_eq!(inventory.tcp[0].con, "192.168.1.10");
        assert_eq!(inventory.rtu.len(), 1);
        assert!(inventory.rtu[0].con.ends_with('0'));
        assert_eq!(inventory.rtu[0].params.baud_rate, 19200);
        assert_eq!(inventory.rtu[0].params.parity, "E");
    }
}
