use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tagdeck_core::data_source::DataSourceType;

use crate::https::HttpsConnector;
use crate::modbus::ModbusConnector;
use crate::mqtt::MqttConnector;
use crate::opcua::OpcUaConnector;
use crate::s7::S7Connector;
use crate::simulated::SimulatedConnector;
use crate::websocket::WebSocketConnector;
use crate::{Connector, ConnectorError, ConnectorMode, SampleData};

/// Connector lookup keyed by data-source type.
#[derive(Clone, Default)]
pub struct ConnectorRegistry {
    connectors: HashMap<DataSourceType, Arc<dyn Connector>>,
}

impl ConnectorRegistry {
    /// An empty registry. Every test fails with `Unsupported` until
    /// connectors are registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the connector for `kind`.
    pub fn register(&mut self, kind: DataSourceType, connector: Arc<dyn Connector>) -> &mut Self {
        self.connectors.insert(kind, connector);
        self
    }

    pub fn get(&self, kind: DataSourceType) -> Option<Arc<dyn Connector>> {
        self.connectors.get(&kind).cloned()
    }

    /// Real protocol clients for every type. `timeout` bounds the raw-socket
    /// connectors; HTTPS keeps its own fixed timeout.
    pub fn live(timeout: Duration) -> Result<Self, ConnectorError> {
        let mut registry = Self::new();
        registry
            .register(DataSourceType::Https, Arc::new(HttpsConnector::new()?))
            .register(DataSourceType::Mqtt, Arc::new(MqttConnector::new(timeout)))
            .register(DataSourceType::OpcUa, Arc::new(OpcUaConnector::new(timeout)))
            .register(DataSourceType::Modbus, Arc::new(ModbusConnector::new(timeout)))
            .register(DataSourceType::S7, Arc::new(S7Connector::new(timeout)))
            .register(DataSourceType::WebSocket, Arc::new(WebSocketConnector::new(timeout)));
        Ok(registry)
    }

    /// Simulated connectors for every type except HTTPS, which stays real.
    pub fn simulated() -> Result<Self, ConnectorError> {
        let mut registry = Self::new();
        registry.register(DataSourceType::Https, Arc::new(HttpsConnector::new()?));
        for kind in DataSourceType::ALL {
            if kind != DataSourceType::Https {
                registry.register(kind, Arc::new(SimulatedConnector::new(kind)));
            }
        }
        Ok(registry)
    }

    pub fn from_mode(mode: ConnectorMode, timeout: Duration) -> Result<Self, ConnectorError> {
        match mode {
            ConnectorMode::Live => Self::live(timeout),
            ConnectorMode::Simulated => Self::simulated(),
        }
    }

    /// Run the reachability test registered for `kind`.
    pub async fn test(
        &self,
        kind: DataSourceType,
        endpoint: &str,
        config: &serde_json::Value,
    ) -> Result<SampleData, ConnectorError> {
        let connector = self
            .get(kind)
            .ok_or_else(|| ConnectorError::Unsupported(kind.to_string()))?;
        connector.test_reachability(endpoint, config).await
    }
}
