//! Modbus TCP implementation of [`RegisterClient`]

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::net::lookup_host;
use tokio::time::timeout;
use tokio_modbus::client::Context;
use tokio_modbus::prelude::*;
use tracing::{debug, instrument, trace};

use crate::{Sample, config::ControllerConfig};

use super::{
    ConnectionError, REGISTERS_PER_SAMPLE, ReadError, RegisterAddress, RegisterClient, decode_f32,
};

/// Holding register client for a single controller
#[derive(Debug)]
pub struct ModbusRegisterClient {
    /// `host:port` of the controller
    endpoint: String,

    /// Unit identifier used when opening the session
    unit_id: u8,

    connect_timeout: Duration,
    request_timeout: Duration,

    /// Open session, `None` while disconnected
    context: Option<Context>,
}

impl ModbusRegisterClient {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            endpoint: config.endpoint(),
            unit_id: config.unit_id,
            connect_timeout: config.connect_timeout(),
            request_timeout: config.request_timeout(),
            context: None,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Takes owned values: `Context` is not `Sync`, so `&Self` must not live
    /// across an await in a `Send` future
    async fn open(endpoint: String, unit_id: u8) -> Result<Context, ConnectionError> {
        let socket_addr = lookup_host(endpoint.as_str())
            .await
            .map_err(|e| ConnectionError::Resolve(format!("{endpoint}: {e}")))?
            .next()
            .ok_or_else(|| ConnectionError::Resolve(format!("{endpoint}: no addresses")))?;

        trace!("connecting to {socket_addr}");

        tcp::connect_slave(socket_addr, Slave(unit_id))
            .await
            .map_err(|e| ConnectionError::Refused(format!("{socket_addr}: {e}")))
    }
}

#[async_trait]
impl RegisterClient for ModbusRegisterClient {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn connect(&mut self) -> Result<(), ConnectionError> {
        if self.context.is_some() {
            return Ok(());
        }

        let open = Self::open(self.endpoint.clone(), self.unit_id);
        let context = timeout(self.connect_timeout, open)
            .await
            .map_err(|_| ConnectionError::Timeout)??;

        debug!("connection established");
        self.context = Some(context);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.context.is_some()
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn read_pair(&mut self, address: RegisterAddress) -> Result<Sample, ReadError> {
        let Some(context) = self.context.as_mut() else {
            return Err(ReadError::Transport("not connected".to_string()));
        };

        context.set_slave(Slave(address.unit_id));

        let registers = timeout(
            self.request_timeout,
            context.read_holding_registers(address.address, REGISTERS_PER_SAMPLE as u16),
        )
        .await
        .map_err(|_| ReadError::Transport("request timed out".to_string()))?
        .map_err(|e| ReadError::Transport(e.to_string()))?
        .map_err(|code| ReadError::Protocol(code.to_string()))?;

        trace!("raw registers: {registers:04X?}");

        let value = decode_f32(&registers)?;

        Ok(Sample {
            value,
            timestamp: Utc::now(),
        })
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn close(&mut self) {
        let Some(mut context) = self.context.take() else {
            return;
        };

        match timeout(self.request_timeout, context.disconnect()).await {
            Ok(Ok(())) => debug!("connection closed"),
            Ok(Err(e)) => debug!("error while closing connection: {e}"),
            Err(_) => debug!("timed out closing connection"),
        }
    }
}
