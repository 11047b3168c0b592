//! Helpers shared by the raw-socket connectors.

use std::future::Future;
use std::time::Duration;

use reqwest::Url;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::ConnectorError;

/// Largest frame a handshake reply may announce before it is rejected.
pub(crate) const MAX_FRAME_LEN: usize = 64 * 1024;

/// Run `future`, failing with [`ConnectorError::Timeout`] once `limit` elapses.
pub(crate) async fn with_timeout<T, F>(limit: Duration, future: F) -> Result<T, ConnectorError>
where
    F: Future<Output = Result<T, ConnectorError>>,
{
    tokio::time::timeout(limit, future)
        .await
        .map_err(|_| ConnectorError::Timeout(limit))?
}

/// Host and port extracted from a URL-shaped endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Authority {
    pub host: String,
    pub port: u16,
}

impl Authority {
    /// Parse `endpoint`, requiring one of `schemes` and falling back to
    /// `default_port` when the URL has none.
    pub fn from_url(
        endpoint: &str,
        schemes: &[&str],
        default_port: impl Fn(&str) -> u16,
    ) -> Result<(Self, Url), ConnectorError> {
        let url = Url::parse(endpoint)
            .map_err(|e| ConnectorError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        if !schemes.contains(&url.scheme()) {
            return Err(ConnectorError::InvalidEndpoint(format!(
                "{endpoint}: expected scheme {}",
                schemes.join(" or ")
            )));
        }
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ConnectorError::InvalidEndpoint(format!("{endpoint}: missing host")))?
            .to_string();
        let port = url.port().unwrap_or_else(|| default_port(url.scheme()));
        Ok((Self { host, port }, url))
    }

    /// Parse a bare `IP:PORT` endpoint.
    pub fn from_ip_port(endpoint: &str) -> Result<Self, ConnectorError> {
        let invalid = || ConnectorError::InvalidEndpoint(format!("{endpoint}: expected IP:PORT"));
        let (host, port) = endpoint.trim().rsplit_once(':').ok_or_else(invalid)?;
        let port = port.parse::<u16>().map_err(|_| invalid())?;
        if host.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Read a string setting from a data-source config object.
pub(crate) fn config_str<'a>(config: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    config.get(key).and_then(|v| v.as_str()).filter(|s| !s.is_empty())
}

/// Read an unsigned integer setting, accepting numbers or numeric strings.
pub(crate) fn config_u64(
    config: &serde_json::Value,
    key: &str,
) -> Result<Option<u64>, ConnectorError> {
    match config.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| ConnectorError::InvalidConfig(format!("{key} must be a non-negative integer"))),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConnectorError::InvalidConfig(format!("{key} must be a non-negative integer"))),
        Some(_) => Err(ConnectorError::InvalidConfig(format!(
            "{key} must be a non-negative integer"
        ))),
    }
}

/// Read an integer setting bounded by `max`, defaulting when absent.
pub(crate) fn config_bounded(
    config: &serde_json::Value,
    key: &str,
    default: u64,
    max: u64,
) -> Result<u64, ConnectorError> {
    let value = config_u64(config, key)?.unwrap_or(default);
    if value > max {
        return Err(ConnectorError::InvalidConfig(format!(
            "{key} must be at most {max}, got {value}"
        )));
    }
    Ok(value)
}

/// Read exactly `len` bytes after checking the announced length is sane.
pub(crate) async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
    len: usize,
) -> Result<Vec<u8>, ConnectorError> {
    if len > MAX_FRAME_LEN {
        return Err(ConnectorError::Protocol(format!(
            "peer announced a {len}-byte frame"
        )));
    }
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}
