//! Data-source vocabulary, endpoint shape rules and name uniqueness.
//!
//! A data source is a named external connection (protocol + endpoint +
//! opaque per-type config). Validation here is purely syntactic: it never
//! touches the network.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// `IP:PORT` with four dot-separated decimal octets. Octets are not checked
/// against 255; the connector surfaces unreachable addresses.
static IP_PORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}:[0-9]+$").expect("valid regex")
});

// ---------------------------------------------------------------------------
// DataSourceType
// ---------------------------------------------------------------------------

/// Protocol family of a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataSourceType {
    #[serde(rename = "OPC UA")]
    OpcUa,
    #[serde(rename = "MQTT", alias = "mqtt")]
    Mqtt,
    #[serde(rename = "HTTPS", alias = "rest_api")]
    Https,
    Modbus,
    S7,
    #[serde(rename = "WebSocket", alias = "websocket")]
    WebSocket,
}

impl DataSourceType {
    pub const ALL: [DataSourceType; 6] = [
        Self::OpcUa,
        Self::Mqtt,
        Self::Https,
        Self::Modbus,
        Self::S7,
        Self::WebSocket,
    ];

    /// Label stored in `data_sources.source_type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpcUa => "OPC UA",
            Self::Mqtt => "MQTT",
            Self::Https => "HTTPS",
            Self::Modbus => "Modbus",
            Self::S7 => "S7",
            Self::WebSocket => "WebSocket",
        }
    }

    /// Return a violation message if `endpoint` does not have the shape this
    /// protocol expects.
    pub fn endpoint_violation(&self, endpoint: &str) -> Option<String> {
        let ok = match self {
            Self::OpcUa => endpoint.starts_with("opc.tcp://"),
            Self::Mqtt => endpoint.starts_with("mqtt://") || endpoint.starts_with("mqtts://"),
            Self::Https => endpoint.starts_with("http://") || endpoint.starts_with("https://"),
            Self::Modbus | Self::S7 => IP_PORT_RE.is_match(endpoint),
            Self::WebSocket => endpoint.starts_with("ws://") || endpoint.starts_with("wss://"),
        };
        if ok {
            return None;
        }
        let message = match self {
            Self::OpcUa => "OPC UA endpoint must start with opc.tcp://".to_string(),
            Self::Mqtt => "MQTT endpoint must start with mqtt:// or mqtts://".to_string(),
            Self::Https => "HTTPS endpoint must start with http:// or https://".to_string(),
            Self::Modbus | Self::S7 => format!(
                "{} endpoint must be in IP:PORT format (e.g. 192.168.1.100:502)",
                self.as_str()
            ),
            Self::WebSocket => "WebSocket endpoint must start with ws:// or wss://".to_string(),
        };
        Some(message)
    }
}

impl fmt::Display for DataSourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataSourceType {
    type Err = String;

    /// Accepts canonical labels plus the legacy `rest_api` / `mqtt` /
    /// `websocket` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPC UA" => Ok(Self::OpcUa),
            "MQTT" | "mqtt" => Ok(Self::Mqtt),
            "HTTPS" | "rest_api" => Ok(Self::Https),
            "Modbus" => Ok(Self::Modbus),
            "S7" => Ok(Self::S7),
            "WebSocket" | "websocket" => Ok(Self::WebSocket),
            other => Err(format!("Unknown data source type: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// The validated fields of a data-source create payload or patch.
///
/// `None` means the field is absent from a patch and is not checked.
#[derive(Debug, Default, Clone, Copy)]
pub struct DataSourceCandidate<'a> {
    pub name: Option<&'a str>,
    pub source_type: Option<&'a str>,
    pub endpoint: Option<&'a str>,
}

impl<'a> DataSourceCandidate<'a> {
    /// A candidate for creation: every field is present.
    pub fn complete(name: &'a str, source_type: &'a str, endpoint: &'a str) -> Self {
        Self {
            name: Some(name),
            source_type: Some(source_type),
            endpoint: Some(endpoint),
        }
    }
}

/// Validate a data-source candidate and return every violation, in order:
///
/// 1. name non-empty after trimming
/// 2. type recognized
/// 3. endpoint non-empty
/// 4. endpoint shape for the type (only when 2 and 3 passed)
pub fn validate(candidate: &DataSourceCandidate<'_>) -> Vec<String> {
    let mut violations = Vec::new();

    if let Some(name) = candidate.name {
        if name.trim().is_empty() {
            violations.push("Name is required".to_string());
        }
    }

    let source_type = match candidate.source_type {
        Some(raw) => match raw.parse::<DataSourceType>() {
            Ok(t) => Some(t),
            Err(_) => {
                let labels: Vec<&str> = DataSourceType::ALL.iter().map(|t| t.as_str()).collect();
                violations.push(format!("Type must be one of {}", labels.join(", ")));
                None
            }
        },
        None => None,
    };

    if let Some(endpoint) = candidate.endpoint {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            violations.push("Endpoint is required".to_string());
        } else if let Some(violation) = source_type.and_then(|t| t.endpoint_violation(endpoint)) {
            violations.push(violation);
        }
    }

    violations
}

/// Case-insensitive name comparison used for uniqueness checks.
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
