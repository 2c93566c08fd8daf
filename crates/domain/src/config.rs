use std::collections::{HashMap, HashSet};

use crate::device::{Device, Protocol};
use crate::error::ConfigError;
use crate::link::HostLink;
use crate::record::{DeviceRecord, HostLinkRecord, TagRecord};
use crate::scan::ScanItem;
use crate::tag::Tag;

/// The validated acquisition configuration: host links, devices and tags,
/// cross-checked once at startup. Polling never starts from a partially
/// consistent table set.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemConfig {
    links: Vec<HostLink>,
    devices: Vec<Device>,
    tags: Vec<Tag>,
}

impl SystemConfig {
    /// Single conversion point from persisted/exchanged rows to typed
    /// configuration. Performs all of the startup validation:
    /// field parsing, reference resolution, protocol/link-kind agreement
    /// and function/data-type compatibility.
    pub fn from_records(
        hosts: &[HostLinkRecord],
        devices: &[DeviceRecord],
        tags: &[TagRecord],
    ) -> Result<Self, ConfigError> {
        let links: Vec<HostLink> = hosts
            .iter()
            .map(HostLink::from_record)
            .collect::<Result<_, _>>()?;

        let link_by_name: HashMap<&str, &HostLink> =
            links.iter().map(|l| (l.name.as_str(), l)).collect();

        let mut seen_devices = HashSet::new();
        let devices: Vec<Device> = devices
            .iter()
            .map(|record| {
                let device = Device::from_record(record)?;
                if !seen_devices.insert(device.name.clone()) {
                    return Err(ConfigError::DuplicateDevice(device.name));
                }
                let link = link_by_name.get(device.host_name.as_str()).ok_or_else(|| {
                    ConfigError::UnknownHostLink {
                        device: device.name.clone(),
                        host: device.host_name.clone(),
                    }
                })?;
                let tcp_protocol = device.protocol == Protocol::ModbusTcp;
                if tcp_protocol != link.is_tcp() {
                    return Err(ConfigError::ProtocolMismatch {
                        device: device.name.clone(),
                        protocol: device.protocol.to_string(),
                        host: link.name.clone(),
                        kind: if link.is_tcp() { "TCP" } else { "COM" }.to_string(),
                    });
                }
                Ok(device)
            })
            .collect::<Result<_, _>>()?;

        let device_names: HashSet<&str> = devices.iter().map(|d| d.name.as_str()).collect();
        let tags: Vec<Tag> = tags
            .iter()
            .map(|record| {
                let tag = Tag::from_record(record)?;
                if !device_names.contains(tag.device_name.as_str()) {
                    return Err(ConfigError::UnknownDevice {
                        device: tag.device_name.clone(),
                        address: record.address.clone(),
                    });
                }
                Ok(tag)
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            links,
            devices,
            tags,
        })
    }

    pub fn links(&self) -> &[HostLink] {
        &self.links
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn devices_on_link(&self, link_name: &str) -> Vec<&Device> {
        self.devices
            .iter()
            .filter(|d| d.host_name == link_name)
            .collect()
    }

    /// Scan items for one host link: every tag whose device is bound to the
    /// link, in global tag order, enriched with the device unit id and the
    /// wire register count.
    pub fn scan_items_for_link(&self, link_name: &str) -> Vec<ScanItem> {
        let unit_by_device: HashMap<&str, u8> = self
            .devices
            .iter()
            .filter(|d| d.host_name == link_name)
            .map(|d| (d.name.as_str(), d.unit_id))
            .collect();

        self.tags
            .iter()
            .filter_map(|tag| {
                unit_by_device
                    .get(tag.device_name.as_str())
                    .map(|unit_id| ScanItem::new(tag, *unit_id))
            })
            .collect()
    }

    pub fn to_records(&self) -> (Vec<HostLinkRecord>, Vec<DeviceRecord>, Vec<TagRecord>) {
        (
            self.links.iter().map(HostLink::to_record).collect(),
            self.devices.iter().map(Device::to_record).collect(),
            self.tags.iter().map(Tag::to_record).collect(),
        )
    }
}
