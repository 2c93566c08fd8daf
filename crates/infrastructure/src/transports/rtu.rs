use std::future::Future;

use async_trait::async_trait;
use tokio_modbus::client::Context;
use tokio_modbus::prelude::*;
use tokio_serial::SerialStream;

use domain::{LinkTransport, Parity, SerialParams, TransportError};

use super::{RTU_REQUEST_TIMEOUT, flatten_response};

/// Modbus-RTU client over one serial port. The port is multi-drop: the
/// slave address is switched per request.
pub struct RtuLinkTransport {
    ctx: Context,
}

impl RtuLinkTransport {
    pub fn open(path: &str, serial: &SerialParams) -> Result<Self, TransportError> {
        let builder = tokio_serial::new(path, serial.baud_rate)
            .data_bits(to_data_bits(serial.data_bits)?)
            .parity(to_parity(serial.parity))
            .stop_bits(to_stop_bits(serial.stop_bits)?)
            .timeout(RTU_REQUEST_TIMEOUT);

        let port = SerialStream::open(&builder)
            .map_err(|e| TransportError::Connect(path.to_string(), e.to_string()))?;

        Ok(Self {
            ctx: tokio_modbus::client::rtu::attach_slave(port, Slave(1)),
        })
    }

}

/// Serial responses must arrive within the per-request window; a late or
/// missing reply surfaces as a timeout, never as a stall.
async fn bounded<T, F>(request: F) -> Result<T, TransportError>
where
    F: Future<Output = Result<Result<T, tokio_modbus::Exception>, tokio_modbus::Error>>,
{
    match tokio::time::timeout(RTU_REQUEST_TIMEOUT, request).await {
        Ok(response) => flatten_response(response),
        Err(_) => Err(TransportError::Timeout(RTU_REQUEST_TIMEOUT)),
    }
}

fn to_data_bits(bits: u8) -> Result<tokio_serial::DataBits, TransportError> {
    match bits {
        5 => Ok(tokio_serial::DataBits::Five),
        6 => Ok(tokio_serial::DataBits::Six),
        7 => Ok(tokio_serial::DataBits::Seven),
        8 => Ok(tokio_serial::DataBits::Eight),
        other => Err(TransportError::Io(format!("invalid data bits: {other}"))),
    }
}

fn to_parity(parity: Parity) -> tokio_serial::Parity {
    match parity {
        Parity::None => tokio_serial::Parity::None,
        Parity::Even => tokio_serial::Parity::Even,
        Parity::Odd => tokio_serial::Parity::Odd,
    }
}

fn to_stop_bits(bits: u8) -> Result<tokio_serial::StopBits, TransportError> {
    match bits {
        1 => Ok(tokio_serial::StopBits::One),
        2 => Ok(tokio_serial::StopBits::Two),
        other => Err(TransportError::Io(format!("invalid stop bits: {other}"))),
    }
}

#[async_trait]
impl LinkTransport for RtuLinkTransport {
    async fn read_holding_registers(
        &mut self,
        unit_id: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, TransportError> {
        self.ctx.set_slave(Slave(unit_id));
        bounded(self.ctx.read_holding_registers(address, count)).await
    }

    async fn read_input_registers(
        &mut self,
        unit_id: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, TransportError> {
        self.ctx.set_slave(Slave(unit_id));
        bounded(self.ctx.read_input_registers(address, count)).await
    }

    async fn read_coils(
        &mut self,
        unit_id: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<bool>, TransportError> {
        self.ctx.set_slave(Slave(unit_id));
        bounded(self.ctx.read_coils(address, count)).await
    }

    async fn read_discrete_inputs(
        &mut self,
        unit_id: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<bool>, TransportError> {
        self.ctx.set_slave(Slave(unit_id));
        bounded(self.ctx.read_discrete_inputs(address, count)).await
    }

    async fn write_single_register(
        &mut self,
        unit_id: u8,
        address: u16,
        value: u16,
    ) -> Result<(), TransportError> {
        self.ctx.set_slave(Slave(unit_id));
        bounded(self.ctx.write_single_register(address, value)).await
    }
}
