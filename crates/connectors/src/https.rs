//! HTTPS (REST) connector.
//!
//! Sends one request to the endpoint and expects a JSON object back.
//! Recognized config keys: `method`, `headers`, `authType` (`bearer` or
//! `apiKey`), `token` and `body`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Method;

use crate::support::config_str;
use crate::{Connector, ConnectorError, SampleData};

/// Fixed timeout for a single HTTPS test, independent of `CONNECTOR_TIMEOUT_SECS`.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const API_KEY_HEADER: &str = "x-api-key";

pub struct HttpsConnector {
    client: reqwest::Client,
}

impl HttpsConnector {
    pub fn new() -> Result<Self, ConnectorError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(client))
    }

    /// Reuse an existing client. The caller is responsible for its timeout.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn method_from_config(config: &serde_json::Value) -> Result<Method, ConnectorError> {
    match config_str(config, "method") {
        None => Ok(Method::GET),
        Some(raw) => Method::from_bytes(raw.to_ascii_uppercase().as_bytes())
            .map_err(|_| ConnectorError::InvalidConfig(format!("Unknown HTTP method: {raw}"))),
    }
}

/// Build request headers from `config.headers` plus the configured auth scheme.
fn headers_from_config(config: &serde_json::Value) -> Result<HeaderMap, ConnectorError> {
    let mut headers = HeaderMap::new();

    if let Some(custom) = config.get("headers").and_then(|h| h.as_object()) {
        for (name, value) in custom {
            let Some(value) = value.as_str() else {
                return Err(ConnectorError::InvalidConfig(format!(
                    "Header {name} must be a string"
                )));
            };
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ConnectorError::InvalidConfig(format!("Invalid header name: {name}")))?;
            let value = HeaderValue::from_str(value).map_err(|_| {
                ConnectorError::InvalidConfig(format!("Invalid value for header {name}"))
            })?;
            headers.insert(name, value);
        }
    }

    let token = config_str(config, "token");
    match (config_str(config, "authType"), token) {
        (None, _) => {}
        (Some(kind), None) => {
            return Err(ConnectorError::InvalidConfig(format!(
                "authType {kind} requires a token"
            )));
        }
        (Some("bearer"), Some(token)) => {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ConnectorError::InvalidConfig("Invalid bearer token".into()))?;
            headers.insert(AUTHORIZATION, value);
        }
        (Some("apiKey"), Some(token)) => {
            let value = HeaderValue::from_str(token)
                .map_err(|_| ConnectorError::InvalidConfig("Invalid API key".into()))?;
            headers.insert(HeaderName::from_static(API_KEY_HEADER), value);
        }
        (Some(other), Some(_)) => {
            return Err(ConnectorError::InvalidConfig(format!(
                "authType must be bearer or apiKey, got {other}"
            )));
        }
    }

    Ok(headers)
}

#[async_trait]
impl Connector for HttpsConnector {
    async fn test_reachability(
        &self,
        endpoint: &str,
        config: &serde_json::Value,
    ) -> Result<SampleData, ConnectorError> {
        let method = method_from_config(config)?;
        let headers = headers_from_config(config)?;

        let mut request = self.client.request(method.clone(), endpoint).headers(headers);
        if method != Method::GET {
            if let Some(body) = config.get("body") {
                request = request.json(body);
            }
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ConnectorError::Timeout(REQUEST_TIMEOUT)
            } else {
                ConnectorError::Request(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectorError::HttpStatus(status.as_u16()));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ConnectorError::InvalidBody(e.to_string()))?;
        if !body.is_object() {
            return Err(ConnectorError::InvalidBody(
                "expected a JSON object".to_string(),
            ));
        }

        tracing::debug!(endpoint, %method, status = status.as_u16(), "HTTPS endpoint reachable");
        Ok(SampleData::new(
            format!("{method} {endpoint} returned HTTP {}", status.as_u16()),
            body,
        ))
    }
}
