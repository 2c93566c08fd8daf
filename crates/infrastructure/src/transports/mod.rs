mod rtu;
mod tcp;

pub use rtu::RtuLinkTransport;
pub use tcp::TcpLinkTransport;

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::info;

use domain::{HostLink, LinkKind, LinkTransport, SystemConfig, TransportError};

use crate::settings::Settings;

/// Connect timeout of the TCP transport.
pub const TCP_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-request response timeout of the serial transport.
pub const RTU_REQUEST_TIMEOUT: Duration = Duration::from_millis(50);

/// Turns one validated host link into a live transport handle. TCP links
/// bind their local egress address and dial the gateway endpoint shared by
/// the link's devices; COM links open the serial port assembled from the
/// platform prefix and the persisted suffix.
pub async fn open_link_transport(
    settings: &Settings,
    config: &SystemConfig,
    link: &HostLink,
) -> Result<Box<dyn LinkTransport>> {
    match &link.kind {
        LinkKind::Tcp { address, port } => {
            let Some(endpoint) = config
                .devices_on_link(&link.name)
                .into_iter()
                .find_map(|d| d.endpoint)
            else {
                bail!("host link `{}` has no TCP device endpoint", link.name);
            };

            let local = SocketAddr::from((*address, *port));
            let remote = SocketAddr::from(endpoint);
            let transport = TcpLinkTransport::connect(local, remote)
                .await
                .with_context(|| format!("connecting host link `{}`", link.name))?;
            info!(link = %link.name, %remote, "Modbus-TCP link connected");
            Ok(Box::new(transport))
        }
        LinkKind::Com {
            port_suffix,
            serial,
        } => {
            let path = settings.com_port_device(port_suffix);
            let transport = RtuLinkTransport::open(&path, serial)
                .with_context(|| format!("opening host link `{}`", link.name))?;
            info!(link = %link.name, %path, "Modbus-RTU link opened");
            Ok(Box::new(transport))
        }
    }
}

/// Collapses the nested tokio-modbus result into the domain error space.
fn flatten_response<T>(
    response: Result<Result<T, tokio_modbus::Exception>, tokio_modbus::Error>,
) -> Result<T, TransportError> {
    match response {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(exception)) => Err(TransportError::Exception(exception.to_string())),
        Err(error) => Err(TransportError::Io(error.to_string())),
    }
}
