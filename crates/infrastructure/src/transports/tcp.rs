use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::net::TcpSocket;
use tokio_modbus::client::Context;
use tokio_modbus::prelude::*;

use domain::{LinkTransport, TransportError};

use super::{TCP_CONNECT_TIMEOUT, flatten_response};

/// Modbus-TCP client bound to the link's local egress address. One socket
/// serves every unit id behind the gateway; the slave is selected per
/// request.
pub struct TcpLinkTransport {
    ctx: Context,
}

impl TcpLinkTransport {
    pub async fn connect(local: SocketAddr, remote: SocketAddr) -> Result<Self, TransportError> {
        let socket = TcpSocket::new_v4().map_err(|e| TransportError::Io(e.to_string()))?;
        socket
            .set_reuseaddr(true)
            .map_err(|e| TransportError::Io(e.to_string()))?;
        socket
            .bind(local)
            .map_err(|e| TransportError::Connect(local.to_string(), e.to_string()))?;

        let stream = tokio::time::timeout(TCP_CONNECT_TIMEOUT, socket.connect(remote))
            .await
            .map_err(|_| TransportError::Timeout(TCP_CONNECT_TIMEOUT))?
            .map_err(|e| TransportError::Connect(remote.to_string(), e.to_string()))?;

        Ok(Self {
            ctx: tokio_modbus::client::tcp::attach(stream),
        })
    }
}

#[async_trait]
impl LinkTransport for TcpLinkTransport {
    async fn read_holding_registers(
        &mut self,
        unit_id: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, TransportError> {
        self.ctx.set_slave(Slave(unit_id));
        flatten_response(self.ctx.read_holding_registers(address, count).await)
    }

    async fn read_input_registers(
        &mut self,
        unit_id: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, TransportError> {
        self.ctx.set_slave(Slave(unit_id));
        flatten_response(self.ctx.read_input_registers(address, count).await)
    }

    async fn read_coils(
        &mut self,
        unit_id: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<bool>, TransportError> {
        self.ctx.set_slave(Slave(unit_id));
        flatten_response(self.ctx.read_coils(address, count).await)
    }

    async fn read_discrete_inputs(
        &mut self,
        unit_id: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<bool>, TransportError> {
        self.ctx.set_slave(Slave(unit_id));
        flatten_response(self.ctx.read_discrete_inputs(address, count).await)
    }

    async fn write_single_register(
        &mut self,
        unit_id: u8,
        address: u16,
        value: u16,
    ) -> Result<(), TransportError> {
        self.ctx.set_slave(Slave(unit_id));
        flatten_response(self.ctx.write_single_register(address, value).await)
    }
}
