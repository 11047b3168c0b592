//! Modbus TCP connector.
//!
//! Reads a block of holding registers and returns them keyed by their
//! conventional `4xxxx` reference. Recognized config keys: `unitId`
//! (default 1), `startRegister` (default 0), `registerCount` (default 10).

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio_modbus::client::{tcp, Client, Reader};
use tokio_modbus::Slave;

use crate::support::{config_bounded, with_timeout, Authority};
use crate::{Connector, ConnectorError, SampleData};

const DEFAULT_UNIT_ID: u64 = 1;
const DEFAULT_REGISTER_COUNT: u64 = 10;
/// Protocol limit for a single Read Holding Registers request.
const MAX_REGISTER_COUNT: u64 = 125;

/// Offset of holding register 0 in the `4xxxx` reference space.
const HOLDING_REGISTER_BASE: u32 = 40_001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReadPlan {
    pub unit_id: u8,
    pub start: u16,
    pub count: u16,
}

impl ReadPlan {
    fn from_config(config: &serde_json::Value) -> Result<Self, ConnectorError> {
        let unit_id = config_bounded(config, "unitId", DEFAULT_UNIT_ID, u8::MAX as u64)? as u8;
        let start = config_bounded(config, "startRegister", 0, u16::MAX as u64)? as u16;
        let count = config_bounded(config, "registerCount", DEFAULT_REGISTER_COUNT, MAX_REGISTER_COUNT)? as u16;
        if count == 0 {
            return Err(ConnectorError::InvalidConfig(
                "registerCount must be at least 1".to_string(),
            ));
        }
        if start as u32 + count as u32 > u16::MAX as u32 + 1 {
            return Err(ConnectorError::InvalidConfig(
                "startRegister + registerCount exceeds the register space".to_string(),
            ));
        }
        Ok(Self {
            unit_id,
            start,
            count,
        })
    }
}

/// Key each register value by its `4xxxx` reference.
pub(crate) fn register_map(start: u16, values: &[u16]) -> serde_json::Map<String, serde_json::Value> {
    values
        .iter()
        .enumerate()
        .map(|(offset, value)| {
            let reference = HOLDING_REGISTER_BASE + start as u32 + offset as u32;
            (reference.to_string(), serde_json::Value::from(*value))
        })
        .collect()
}

pub struct ModbusConnector {
    timeout: Duration,
}

impl ModbusConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn run(&self, endpoint: &str, config: &serde_json::Value) -> Result<SampleData, ConnectorError> {
        let authority = Authority::from_ip_port(endpoint)?;
        let socket_addr: SocketAddr = authority
            .address()
            .parse()
            .map_err(|_| ConnectorError::InvalidEndpoint(format!("{endpoint}: not a valid IP address")))?;
        let plan = ReadPlan::from_config(config)?;

        let mut ctx = tcp::connect_slave(socket_addr, Slave(plan.unit_id)).await?;
        let values = ctx
            .read_holding_registers(plan.start, plan.count)
            .await
            .map_err(|e| ConnectorError::Protocol(format!("Modbus transport error: {e}")))?
            .map_err(|code| ConnectorError::Protocol(format!("Modbus exception: {code:?}")))?;

        if let Err(e) = ctx.disconnect().await {
            tracing::debug!(endpoint, error = %e, "Modbus disconnect failed");
        }

        tracing::debug!(endpoint, unit_id = plan.unit_id, count = values.len(), "Read Modbus holding registers");
        Ok(SampleData::new(
            format!(
                "Read {} holding registers from unit {} at {}",
                values.len(),
                plan.unit_id,
                socket_addr
            ),
            serde_json::json!({
                "unitId": plan.unit_id,
                "registers": register_map(plan.start, &values),
            }),
        ))
    }
}

#[async_trait]
impl Connector for ModbusConnector {
    async fn test_reachability(
        &self,
        endpoint: &str,
        config: &serde_json::Value,
    ) -> Result<SampleData, ConnectorError> {
        with_timeout(self.timeout, self.run(endpoint, config)).await
    }
}
