//! Register protocol access
//!
//! A [`RegisterClient`] owns a single session to the controller. The poll
//! cycle opens it lazily, reads one register pair per channel and releases it
//! according to the configured [`ReconnectPolicy`](crate::config::ReconnectPolicy).
//!
//! Values are stored by the controller as IEEE-754 binary32 split over two
//! consecutive 16-bit holding registers, high word first.

pub mod error;
pub mod modbus;

use async_trait::async_trait;

use crate::{Sample, config::ChannelConfig};

pub use error::{ConnectionError, ReadError};
pub use modbus::ModbusRegisterClient;

/// Registers read per sample
pub const REGISTERS_PER_SAMPLE: usize = 2;

/// Location of a register pair on the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterAddress {
    pub unit_id: u8,
    pub address: u16,
}

impl RegisterAddress {
    pub fn for_channel(channel: &ChannelConfig, default_unit_id: u8) -> Self {
        Self {
            unit_id: channel.unit_id.unwrap_or(default_unit_id),
            address: channel.address,
        }
    }
}

#[async_trait]
pub trait RegisterClient: Send {
    /// Open the session if it is not already open
    async fn connect(&mut self) -> Result<(), ConnectionError>;

    fn is_connected(&self) -> bool;

    /// Read and decode the register pair at `address`
    async fn read_pair(&mut self, address: RegisterAddress) -> Result<Sample, ReadError>;

    /// Drop the session. Calling this on a closed session does nothing.
    async fn close(&mut self);
}

/// Decode `[high, low]` into a big-endian binary32
pub fn decode_f32(registers: &[u16]) -> Result<f32, ReadError> {
    let [high, low] = registers else {
        return Err(ReadError::Malformed {
            expected: REGISTERS_PER_SAMPLE,
            received: registers.len(),
        });
    };

    let [h0, h1] = high.to_be_bytes();
    let [l0, l1] = low.to_be_bytes();
    Ok(f32::from_be_bytes([h0, h1, l0, l1]))
}
