//! Per-protocol reachability tests for data sources.
//!
//! A [`Connector`] opens a connection to an endpoint, performs the smallest
//! meaningful exchange for its protocol and reports what it saw. Connectors
//! never keep a connection open past the test. [`ConnectorRegistry`] maps
//! each `DataSourceType` to its connector.

pub mod error;
pub mod https;
pub mod modbus;
pub mod mqtt;
pub mod opcua;
pub mod registry;
pub mod s7;
pub mod simulated;
pub mod websocket;

mod support;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

pub use error::ConnectorError;
pub use registry::ConnectorRegistry;

/// Timeout applied to non-HTTPS connectors unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// What a successful test observed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleData {
    pub message: String,
    pub data: serde_json::Value,
}

impl SampleData {
    pub fn new(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

/// A protocol client able to test whether an endpoint is reachable.
///
/// `config` is the data source's opaque per-type settings object.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn test_reachability(
        &self,
        endpoint: &str,
        config: &serde_json::Value,
    ) -> Result<SampleData, ConnectorError>;
}

/// Whether the registry talks to real endpoints or fabricates results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectorMode {
    #[default]
    Live,
    /// Fixed artificial delay and fabricated payloads, for demos and UI work.
    Simulated,
}

impl FromStr for ConnectorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "simulated" => Ok(Self::Simulated),
            other => Err(format!("CONNECTOR_MODE must be live or simulated, got {other}")),
        }
    }
}

impl fmt::Display for ConnectorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => f.write_str("live"),
            Self::Simulated => f.write_str("simulated"),
        }
    }
}
