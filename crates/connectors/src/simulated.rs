//! Connectors that never touch the network.
//!
//! Each call sleeps for a random delay and returns a payload shaped like
//! what the real protocol would report.

use std::ops::RangeInclusive;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde_json::json;
use tagdeck_core::data_source::DataSourceType;

use crate::{Connector, ConnectorError, SampleData};

/// Delay range in milliseconds.
pub const DEFAULT_DELAY_MS: RangeInclusive<u64> = 1000..=1500;

pub struct SimulatedConnector {
    kind: DataSourceType,
    delay_ms: RangeInclusive<u64>,
}

impl SimulatedConnector {
    pub fn new(kind: DataSourceType) -> Self {
        Self {
            kind,
            delay_ms: DEFAULT_DELAY_MS,
        }
    }

    pub fn with_delay(kind: DataSourceType, delay_ms: RangeInclusive<u64>) -> Self {
        Self { kind, delay_ms }
    }
}

/// Fabricate the sample payload for `kind`.
fn sample_payload<R: Rng>(kind: DataSourceType, endpoint: &str, rng: &mut R) -> serde_json::Value {
    match kind {
        DataSourceType::Mqtt => json!({
            "topics": {
                "plant/line1/temperature": rng.random_range(18.0..28.0_f64),
                "plant/line1/pressure": rng.random_range(0.9..1.2_f64),
                "plant/line1/running": rng.random_bool(0.5),
            }
        }),
        DataSourceType::OpcUa => json!({
            "nodes": {
                "ns=2;s=Machine.Speed": rng.random_range(0..1500),
                "ns=2;s=Machine.Temperature": rng.random_range(20.0..90.0_f64),
                "ns=2;s=Machine.State": "Running",
            }
        }),
        DataSourceType::Modbus => {
            let registers: serde_json::Map<String, serde_json::Value> = (0..10u32)
                .map(|offset| {
                    let value: u16 = rng.random();
                    ((40_001 + offset).to_string(), value.into())
                })
                .collect();
            json!({ "unitId": 1, "registers": registers })
        }
        DataSourceType::S7 => json!({
            "rack": 0,
            "slot": 1,
            "dataBlocks": {
                "DB1.DBW0": rng.random_range(0..32_767),
                "DB1.DBX2.0": rng.random_bool(0.5),
                "DB2.DBD4": rng.random_range(0.0..100.0_f64),
            }
        }),
        DataSourceType::WebSocket => json!({
            "lastMessage": {
                "source": endpoint,
                "value": rng.random_range(0.0..100.0_f64),
            }
        }),
        DataSourceType::Https => json!({ "status": "ok" }),
    }
}

#[async_trait]
impl Connector for SimulatedConnector {
    async fn test_reachability(
        &self,
        endpoint: &str,
        _config: &serde_json::Value,
    ) -> Result<SampleData, ConnectorError> {
        let (delay, data) = {
            let mut rng = rand::rng();
            let delay = rng.random_range(self.delay_ms.clone());
            (delay, sample_payload(self.kind, endpoint, &mut rng))
        };
        tokio::time::sleep(Duration::from_millis(delay)).await;

        tracing::debug!(endpoint, kind = %self.kind, delay_ms = delay, "Simulated connection test");
        Ok(SampleData::new(
            format!("Simulated {} connection to {endpoint}", self.kind),
            data,
        ))
    }
}
