//! CSV configuration exchange.
//!
//! One file carries all three configuration sections; the leading column
//! names the record kind (`host`, `device`, `tag`) and the remaining
//! columns mirror the persisted rows. Used by the import/export/preview
//! maintenance actions.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, WriterBuilder};
use tracing::info;

use domain::{DeviceRecord, HostLinkRecord, TagRecord};

const KIND_HOST: &str = "host";
const KIND_DEVICE: &str = "device";
const KIND_TAG: &str = "tag";

/// Reads an exchange file into raw configuration records. Validation is
/// not performed here; the loader validates on import.
pub fn read_exchange(
    path: &Path,
) -> Result<(Vec<HostLinkRecord>, Vec<DeviceRecord>, Vec<TagRecord>)> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening exchange file {}", path.display()))?;

    let mut hosts = Vec::new();
    let mut devices = Vec::new();
    let mut tags = Vec::new();

    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("reading exchange line {}", line + 1))?;
        let field = |i: usize| record.get(i).unwrap_or_default().trim().to_string();

        match record.get(0).map(str::trim) {
            Some(KIND_HOST) => {
                if record.len() != 9 {
                    bail!("exchange line {}: host rows need 9 columns", line + 1);
                }
                hosts.push(HostLinkRecord {
                    host: field(1),
                    contype: field(2),
                    address: field(3),
                    port: field(4),
                    baudrate: field(5),
                    databits: field(6),
                    parity: field(7),
                    stopbits: field(8),
                });
            }
            Some(KIND_DEVICE) => {
                if record.len() != 8 {
                    bail!("exchange line {}: device rows need 8 columns", line + 1);
                }
                devices.push(DeviceRecord {
                    device: field(1),
                    comment: field(2),
                    host: field(3),
                    protocol: field(4),
                    address: field(5),
                    ip: field(6),
                    port: field(7),
                });
            }
            Some(KIND_TAG) => {
                if record.len() != 8 {
                    bail!("exchange line {}: tag rows need 8 columns", line + 1);
                }
                tags.push(TagRecord {
                    device: field(1),
                    address: field(2),
                    datatype: field(3),
                    comment: field(4),
                    timescan: field(5),
                    functype: field(6),
                    format: field(7),
                });
            }
            Some("") | None => continue,
            Some(other) => bail!("exchange line {}: unknown record kind `{other}`", line + 1),
        }
    }

    info!(
        hosts = hosts.len(),
        devices = devices.len(),
        tags = tags.len(),
        file = %path.display(),
        "exchange file read"
    );
    Ok((hosts, devices, tags))
}

/// Writes configuration records back out in exchange-file form.
pub fn write_exchange(
    path: &Path,
    hosts: &[HostLinkRecord],
    devices: &[DeviceRecord],
    tags: &[TagRecord],
) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating export directory {}", parent.display()))?;
    }

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("creating exchange file {}", path.display()))?;

    for h in hosts {
        writer.write_record([
            KIND_HOST,
            &h.host,
            &h.contype,
            &h.address,
            &h.port,
            &h.baudrate,
            &h.databits,
            &h.parity,
            &h.stopbits,
        ])?;
    }
    for d in devices {
        writer.write_record([
            KIND_DEVICE,
            &d.device,
            &d.comment,
            &d.host,
            &d.protocol,
            &d.address,
            &d.ip,
            &d.port,
        ])?;
    }
    for t in tags {
        writer.write_record([
            KIND_TAG,
            &t.device,
            &t.address,
            &t.datatype,
            &t.comment,
            &t.timescan,
            &t.functype,
            &t.format,
        ])?;
    }

    writer.flush().context("flushing exchange file")?;
    info!(file = %path.display(), "exchange file written");
    Ok(())
}

/// Renders the archive rows of one day as CSV for the download endpoint.
pub fn render_archive_csv(rows: &[crate::database::ArchiveRow]) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(["Name", "Value", "Qual", "TimeStamp"])?;
    for row in rows {
        writer.write_record([&row.name, &row.value, &row.qual, &row.timestamp])?;
    }
    Ok(writer.into_inner().context("finishing archive csv")?)
}

/// Human preview of an exchange file, used by the import preview action.
pub fn render_preview(
    hosts: &[HostLinkRecord],
    devices: &[DeviceRecord],
    tags: &[TagRecord],
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Host links ({}):", hosts.len());
    let _ = writeln!(
        out,
        "  {:<12} {:<6} {:<16} {:<6} {:<8} {:<4} {:<3} {:<3}",
        "Host:", "Type:", "Address:", "Port:", "Baud:", "Db:", "P:", "Sb:"
    );
    for h in hosts {
        let _ = writeln!(
            out,
            "  {:<12} {:<6} {:<16} {:<6} {:<8} {:<4} {:<3} {:<3}",
            h.host, h.contype, h.address, h.port, h.baudrate, h.databits, h.parity, h.stopbits
        );
    }

    let _ = writeln!(out, "Devices ({}):", devices.len());
    let _ = writeln!(
        out,
        "  {:<12} {:<20} {:<12} {:<12} {:<5} {:<16} {:<6}",
        "Device:", "Comment:", "Host:", "Type:", "Addr:", "IP:", "Port:"
    );
    for d in devices {
        let _ = writeln!(
            out,
            "  {:<12} {:<20} {:<12} {:<12} {:<5} {:<16} {:<6}",
            d.device, d.comment, d.host, d.protocol, d.address, d.ip, d.port
        );
    }

    let _ = writeln!(out, "Tags ({}):", tags.len());
    let _ = writeln!(
        out,
        "  {:<12} {:<6} {:<10} {:<20} {:<9} {:<22} {:<10}",
        "Device:", "Addr:", "DataType:", "Comment:", "TimeScan:", "FuncType:", "Format:"
    );
    for t in tags {
        let _ = writeln!(
            out,
            "  {:<12} {:<6} {:<10} {:<20} {:<9} {:<22} {:<10}",
            t.device, t.address, t.datatype, t.comment, t.timescan, t.functype, t.format
        );
    }

    out
}
