//! OPC UA connector (UA-TCP binary transport).
//!
//! Performs the transport-level Hello/Acknowledge exchange only; no secure
//! channel or session is opened.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::support::{read_frame, with_timeout, Authority};
use crate::{Connector, ConnectorError, SampleData};

pub const DEFAULT_PORT: u16 = 4840;

const HEADER_LEN: usize = 8;
const BUFFER_SIZE: u32 = 65_535;

/// Limits the server accepted in its ACK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Acknowledge {
    pub protocol_version: u32,
    pub receive_buffer_size: u32,
    pub send_buffer_size: u32,
    pub max_message_size: u32,
    pub max_chunk_count: u32,
}

/// Build a HEL message for `endpoint_url`.
pub(crate) fn encode_hello(endpoint_url: &str) -> Vec<u8> {
    let mut body = Vec::with_capacity(24 + endpoint_url.len());
    body.extend_from_slice(&0u32.to_le_bytes()); // protocol version
    body.extend_from_slice(&BUFFER_SIZE.to_le_bytes()); // receive buffer
    body.extend_from_slice(&BUFFER_SIZE.to_le_bytes()); // send buffer
    body.extend_from_slice(&0u32.to_le_bytes()); // max message size: no limit
    body.extend_from_slice(&0u32.to_le_bytes()); // max chunk count: no limit
    body.extend_from_slice(&(endpoint_url.len() as i32).to_le_bytes());
    body.extend_from_slice(endpoint_url.as_bytes());

    let mut message = Vec::with_capacity(HEADER_LEN + body.len());
    message.extend_from_slice(b"HELF");
    message.extend_from_slice(&((HEADER_LEN + body.len()) as u32).to_le_bytes());
    message.extend_from_slice(&body);
    message
}

fn u32_at(bytes: &[u8], offset: usize) -> Result<u32, ConnectorError> {
    bytes
        .get(offset..offset + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| ConnectorError::Protocol("truncated OPC UA message".to_string()))
}

fn decode_acknowledge(body: &[u8]) -> Result<Acknowledge, ConnectorError> {
    Ok(Acknowledge {
        protocol_version: u32_at(body, 0)?,
        receive_buffer_size: u32_at(body, 4)?,
        send_buffer_size: u32_at(body, 8)?,
        max_message_size: u32_at(body, 12)?,
        max_chunk_count: u32_at(body, 16)?,
    })
}

/// Decode an ERR body into a protocol error carrying the status code and reason.
fn decode_error(body: &[u8]) -> ConnectorError {
    let Ok(status) = u32_at(body, 0) else {
        return ConnectorError::Protocol("server sent a truncated ERR message".to_string());
    };
    let reason = u32_at(body, 4)
        .ok()
        .map(|len| len as i32)
        .filter(|len| *len > 0)
        .and_then(|len| body.get(8..8 + len as usize))
        .map(|raw| String::from_utf8_lossy(raw).into_owned())
        .unwrap_or_default();
    ConnectorError::Protocol(format!("server rejected Hello: 0x{status:08X} {reason}").trim_end().to_string())
}

/// Send HEL and read the server's ACK or ERR.
pub(crate) async fn hello<S>(stream: &mut S, endpoint_url: &str) -> Result<Acknowledge, ConnectorError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(&encode_hello(endpoint_url)).await?;
    stream.flush().await?;

    let mut header = [0u8; HEADER_LEN];
    stream.read_exact(&mut header).await?;
    let size = u32_at(&header, 4)? as usize;
    if size < HEADER_LEN {
        return Err(ConnectorError::Protocol(format!(
            "invalid OPC UA message size {size}"
        )));
    }
    let body = read_frame(stream, size - HEADER_LEN).await?;

    match &header[0..3] {
        b"ACK" => decode_acknowledge(&body),
        b"ERR" => Err(decode_error(&body)),
        other => Err(ConnectorError::Protocol(format!(
            "expected ACK, got {}",
            String::from_utf8_lossy(other)
        ))),
    }
}

pub struct OpcUaConnector {
    timeout: Duration,
}

impl OpcUaConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn run(&self, endpoint: &str) -> Result<SampleData, ConnectorError> {
        let (authority, _) = Authority::from_url(endpoint, &["opc.tcp"], |_| DEFAULT_PORT)?;
        let mut stream = TcpStream::connect(authority.address()).await?;
        let ack = hello(&mut stream, endpoint).await?;

        tracing::debug!(endpoint, receive_buffer = ack.receive_buffer_size, "OPC UA server acknowledged Hello");
        Ok(SampleData::new(
            format!("OPC UA server at {} acknowledged Hello", authority.address()),
            serde_json::json!({
                "protocolVersion": ack.protocol_version,
                "receiveBufferSize": ack.receive_buffer_size,
                "sendBufferSize": ack.send_buffer_size,
                "maxMessageSize": ack.max_message_size,
                "maxChunkCount": ack.max_chunk_count,
            }),
        ))
    }
}

#[async_trait]
impl Connector for OpcUaConnector {
    async fn test_reachability(
        &self,
        endpoint: &str,
        _config: &serde_json::Value,
    ) -> Result<SampleData, ConnectorError> {
        with_timeout(self.timeout, self.run(endpoint)).await
    }
}
