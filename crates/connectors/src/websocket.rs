//! WebSocket connector.
//!
//! Completes the opening handshake, reports the negotiated sub-protocol and
//! closes the connection cleanly. Recognized config keys: `protocols`
//! (array of sub-protocol names, or a comma-separated string).

use std::time::Duration;

use async_trait::async_trait;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::HeaderValue;

use crate::support::with_timeout;
use crate::{Connector, ConnectorError, SampleData};

/// Collect the requested sub-protocols from `config.protocols`.
pub(crate) fn requested_protocols(config: &serde_json::Value) -> Result<Vec<String>, ConnectorError> {
    let invalid = || {
        ConnectorError::InvalidConfig(
            "protocols must be a string or an array of strings".to_string(),
        )
    };
    let names: Vec<String> = match config.get("protocols") {
        None | Some(serde_json::Value::Null) => Vec::new(),
        Some(serde_json::Value::String(s)) => s.split(',').map(|p| p.trim().to_string()).collect(),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(|s| s.trim().to_string()).ok_or_else(invalid))
            .collect::<Result<_, _>>()?,
        Some(_) => return Err(invalid()),
    };
    Ok(names.into_iter().filter(|p| !p.is_empty()).collect())
}

pub struct WebSocketConnector {
    timeout: Duration,
}

impl WebSocketConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn run(&self, endpoint: &str, config: &serde_json::Value) -> Result<SampleData, ConnectorError> {
        let protocols = requested_protocols(config)?;
        let mut request = endpoint.into_client_request()?;
        if !protocols.is_empty() {
            let value = HeaderValue::from_str(&protocols.join(", ")).map_err(|_| {
                ConnectorError::InvalidConfig("protocols contain invalid characters".to_string())
            })?;
            request.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, value);
        }

        let (mut ws, response) = tokio_tungstenite::connect_async(request).await?;
        let status = response.status().as_u16();
        let protocol = response
            .headers()
            .get(SEC_WEBSOCKET_PROTOCOL)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if let Err(e) = ws.close(None).await {
            tracing::debug!(endpoint, error = %e, "WebSocket close failed");
        }

        tracing::debug!(endpoint, status, protocol = ?protocol, "WebSocket handshake completed");
        Ok(SampleData::new(
            format!("WebSocket handshake with {endpoint} completed"),
            serde_json::json!({
                "status": status,
                "protocol": protocol,
            }),
        ))
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn test_reachability(
        &self,
        endpoint: &str,
        config: &serde_json::Value,
    ) -> Result<SampleData, ConnectorError> {
        with_timeout(self.timeout, self.run(endpoint, config)).await
    }
}
