use async_trait::async_trait;

use crate::error::TransportError;

/// Wire operations of one host link. Each driver exclusively owns one
/// implementation; unit ids select the slave per request (RTU multi-drop,
/// TCP-to-serial gateways).
#[async_trait]
pub trait LinkTransport: Send {
    async fn read_holding_registers(
        &mut self,
        unit_id: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, TransportError>;

    async fn read_input_registers(
        &mut self,
        unit_id: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, TransportError>;

    async fn read_coils(
        &mut self,
        unit_id: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<bool>, TransportError>;

    async fn read_discrete_inputs(
        &mut self,
        unit_id: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<bool>, TransportError>;

    /// The single write primitive. Not reachable from the cyclic scan path.
    async fn write_single_register(
        &mut self,
        unit_id: u8,
        address: u16,
        value: u16,
    ) -> Result<(), TransportError>;
}
