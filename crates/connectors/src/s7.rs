//! Siemens S7 connector (ISO-on-TCP).
//!
//! Sends a COTP connection request addressed by rack and slot, then the S7
//! "setup communication" job, and reports the PDU size the PLC negotiated.
//! Recognized config keys: `rack` (default 0), `slot` (default 1).

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::support::{config_bounded, read_frame, with_timeout, Authority};
use crate::{Connector, ConnectorError, SampleData};

const DEFAULT_RACK: u64 = 0;
const DEFAULT_SLOT: u64 = 1;
const MAX_RACK: u64 = 7;
const MAX_SLOT: u64 = 31;

const TPKT_VERSION: u8 = 0x03;
const COTP_CONNECTION_CONFIRM: u8 = 0xD0;
const S7_PROTOCOL_ID: u8 = 0x32;
const S7_ACK_DATA: u8 = 0x03;
/// PDU size proposed to the PLC.
const REQUESTED_PDU_SIZE: u16 = 480;

/// Local TSAP used by PG-class connections.
const LOCAL_TSAP: [u8; 2] = [0x01, 0x00];
const CONNECTION_TYPE_PG: u8 = 0x01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Address {
    pub rack: u8,
    pub slot: u8,
}

impl Address {
    fn from_config(config: &serde_json::Value) -> Result<Self, ConnectorError> {
        Ok(Self {
            rack: config_bounded(config, "rack", DEFAULT_RACK, MAX_RACK)? as u8,
            slot: config_bounded(config, "slot", DEFAULT_SLOT, MAX_SLOT)? as u8,
        })
    }

    fn remote_tsap(&self) -> [u8; 2] {
        [CONNECTION_TYPE_PG, self.rack * 0x20 + self.slot]
    }
}

fn tpkt(payload: &[u8]) -> Vec<u8> {
    let len = (4 + payload.len()) as u16;
    let mut frame = vec![TPKT_VERSION, 0x00];
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// COTP connection request (CR) wrapped in TPKT.
pub(crate) fn encode_connection_request(address: Address) -> Vec<u8> {
    let remote = address.remote_tsap();
    let cotp = [
        0x11, // length indicator
        0xE0, // CR
        0x00, 0x00, // destination reference
        0x00, 0x01, // source reference
        0x00, // class 0
        0xC0, 0x01, 0x0A, // TPDU size 1024
        0xC1, 0x02, LOCAL_TSAP[0], LOCAL_TSAP[1],
        0xC2, 0x02, remote[0], remote[1],
    ];
    tpkt(&cotp)
}

/// S7 setup-communication job wrapped in COTP DT and TPKT.
pub(crate) fn encode_setup_communication() -> Vec<u8> {
    let pdu = REQUESTED_PDU_SIZE.to_be_bytes();
    let payload = [
        0x02, 0xF0, 0x80, // COTP DT, last data unit
        S7_PROTOCOL_ID, 0x01, // job
        0x00, 0x00, // redundancy id
        0x00, 0x01, // PDU reference
        0x00, 0x08, // parameter length
        0x00, 0x00, // data length
        0xF0, 0x00, // setup communication
        0x00, 0x01, // max AmQ calling
        0x00, 0x01, // max AmQ called
        pdu[0], pdu[1],
    ];
    tpkt(&payload)
}

/// Read one TPKT frame and return its payload.
async fn read_tpkt<S: AsyncRead + Unpin>(stream: &mut S) -> Result<Vec<u8>, ConnectorError> {
    let mut header = [0u8; 4];
    stream.read_exact(&mut header).await?;
    if header[0] != TPKT_VERSION {
        return Err(ConnectorError::Protocol(format!(
            "not an ISO-on-TCP peer (TPKT version 0x{:02X})",
            header[0]
        )));
    }
    let len = u16::from_be_bytes([header[2], header[3]]) as usize;
    if len < 4 {
        return Err(ConnectorError::Protocol(format!("invalid TPKT length {len}")));
    }
    read_frame(stream, len - 4).await
}

/// Extract the negotiated PDU size from a setup-communication ack.
pub(crate) fn decode_setup_ack(payload: &[u8]) -> Result<u16, ConnectorError> {
    // COTP DT (3) + S7 ack header (12) + setup parameters (8)
    if payload.len() < 23 {
        return Err(ConnectorError::Protocol(
            "truncated setup-communication reply".to_string(),
        ));
    }
    let s7 = &payload[3..];
    if s7[0] != S7_PROTOCOL_ID || s7[1] != S7_ACK_DATA {
        return Err(ConnectorError::Protocol(
            "unexpected reply to setup communication".to_string(),
        ));
    }
    let (error_class, error_code) = (s7[10], s7[11]);
    if error_class != 0 || error_code != 0 {
        return Err(ConnectorError::Protocol(format!(
            "PLC rejected setup communication (class 0x{error_class:02X}, code 0x{error_code:02X})"
        )));
    }
    Ok(u16::from_be_bytes([s7[18], s7[19]]))
}

pub(crate) async fn negotiate<S>(stream: &mut S, address: Address) -> Result<u16, ConnectorError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(&encode_connection_request(address)).await?;
    stream.flush().await?;
    let confirm = read_tpkt(stream).await?;
    if confirm.get(1).map(|t| t & 0xF0) != Some(COTP_CONNECTION_CONFIRM) {
        return Err(ConnectorError::Protocol(format!(
            "PLC refused the connection for rack {} slot {}",
            address.rack, address.slot
        )));
    }

    stream.write_all(&encode_setup_communication()).await?;
    stream.flush().await?;
    let ack = read_tpkt(stream).await?;
    decode_setup_ack(&ack)
}

pub struct S7Connector {
    timeout: Duration,
}

impl S7Connector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn run(&self, endpoint: &str, config: &serde_json::Value) -> Result<SampleData, ConnectorError> {
        let authority = Authority::from_ip_port(endpoint)?;
        let address = Address::from_config(config)?;
        let mut stream = TcpStream::connect(authority.address()).await?;
        let pdu_size = negotiate(&mut stream, address).await?;

        tracing::debug!(endpoint, rack = address.rack, slot = address.slot, pdu_size, "S7 PLC accepted connection");
        Ok(SampleData::new(
            format!(
                "Connected to S7 PLC at {} (rack {}, slot {})",
                authority.address(),
                address.rack,
                address.slot
            ),
            serde_json::json!({
                "rack": address.rack,
                "slot": address.slot,
                "pduSize": pdu_size,
            }),
        ))
    }
}

#[async_trait]
impl Connector for S7Connector {
    async fn test_reachability(
        &self,
        endpoint: &str,
        config: &serde_json::Value,
    ) -> Result<SampleData, ConnectorError> {
        with_timeout(self.timeout, self.run(endpoint, config)).await
    }
}
