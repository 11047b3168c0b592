//! MQTT 3.1.1 connector.
//!
//! Opens a clean session, waits for CONNACK and disconnects again. `mqtts://`
//! endpoints are wrapped in TLS verified against the webpki root store.
//! Recognized config keys: `clientId`, `username`, `password`, `keepAlive`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::support::{config_bounded, config_str, with_timeout, Authority};
use crate::{Connector, ConnectorError, SampleData};

pub const DEFAULT_PORT: u16 = 1883;
pub const DEFAULT_TLS_PORT: u16 = 8883;

const DEFAULT_KEEP_ALIVE_SECS: u64 = 30;

const CONNECT: u8 = 0x10;
const CONNACK: u8 = 0x20;
const DISCONNECT: [u8; 2] = [0xE0, 0x00];

const FLAG_CLEAN_SESSION: u8 = 0x02;
const FLAG_PASSWORD: u8 = 0x40;
const FLAG_USERNAME: u8 = 0x80;

/// Settings for one CONNECT packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConnectOptions {
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive_secs: u16,
}

impl ConnectOptions {
    fn from_config(config: &serde_json::Value) -> Result<Self, ConnectorError> {
        let client_id = config_str(config, "clientId")
            .map(str::to_string)
            .unwrap_or_else(|| format!("tagdeck-{}", uuid::Uuid::new_v4().simple()));
        let username = config_str(config, "username").map(str::to_string);
        let password = config_str(config, "password").map(str::to_string);
        if password.is_some() && username.is_none() {
            return Err(ConnectorError::InvalidConfig(
                "MQTT password requires a username".to_string(),
            ));
        }
        let keep_alive_secs =
            config_bounded(config, "keepAlive", DEFAULT_KEEP_ALIVE_SECS, u16::MAX as u64)? as u16;
        Ok(Self {
            client_id,
            username,
            password,
            keep_alive_secs,
        })
    }
}

/// Encode the MQTT variable-length "remaining length" field.
fn encode_remaining_length(mut len: usize, out: &mut Vec<u8>) {
    loop {
        let mut byte = (len % 128) as u8;
        len /= 128;
        if len > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if len == 0 {
            break;
        }
    }
}

fn push_string(value: &str, out: &mut Vec<u8>) {
    out.extend_from_slice(&(value.len() as u16).to_be_bytes());
    out.extend_from_slice(value.as_bytes());
}

/// Build a CONNECT packet with a clean session.
pub(crate) fn encode_connect(options: &ConnectOptions) -> Vec<u8> {
    let mut flags = FLAG_CLEAN_SESSION;
    if options.username.is_some() {
        flags |= FLAG_USERNAME;
    }
    if options.password.is_some() {
        flags |= FLAG_PASSWORD;
    }

    let mut body = Vec::new();
    push_string("MQTT", &mut body);
    body.push(0x04); // protocol level 3.1.1
    body.push(flags);
    body.extend_from_slice(&options.keep_alive_secs.to_be_bytes());
    push_string(&options.client_id, &mut body);
    if let Some(username) = &options.username {
        push_string(username, &mut body);
    }
    if let Some(password) = &options.password {
        push_string(password, &mut body);
    }

    let mut packet = vec![CONNECT];
    encode_remaining_length(body.len(), &mut packet);
    packet.extend_from_slice(&body);
    packet
}

/// Broker's reason for a non-zero CONNACK return code.
fn refusal_reason(code: u8) -> &'static str {
    match code {
        1 => "unacceptable protocol version",
        2 => "client identifier rejected",
        3 => "server unavailable",
        4 => "bad username or password",
        5 => "not authorized",
        _ => "unknown return code",
    }
}

/// Send CONNECT, read CONNACK, send DISCONNECT. Returns `session present`.
pub(crate) async fn handshake<S>(stream: &mut S, options: &ConnectOptions) -> Result<bool, ConnectorError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(&encode_connect(options)).await?;
    stream.flush().await?;

    let mut connack = [0u8; 4];
    stream.read_exact(&mut connack).await?;
    if connack[0] != CONNACK || connack[1] != 0x02 {
        return Err(ConnectorError::Protocol(format!(
            "expected CONNACK, got packet 0x{:02X}",
            connack[0]
        )));
    }
    let return_code = connack[3];
    if return_code != 0 {
        return Err(ConnectorError::Protocol(format!(
            "broker refused connection: {} (code {return_code})",
            refusal_reason(return_code)
        )));
    }

    stream.write_all(&DISCONNECT).await?;
    stream.flush().await?;
    Ok(connack[2] & 0x01 == 0x01)
}

fn tls_connector() -> Result<TlsConnector, ConnectorError> {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let config = rustls::ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(|e| ConnectorError::Protocol(format!("TLS setup failed: {e}")))?
    .with_root_certificates(roots)
    .with_no_client_auth();
    Ok(TlsConnector::from(Arc::new(config)))
}

pub struct MqttConnector {
    timeout: Duration,
}

impl MqttConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn run(&self, endpoint: &str, config: &serde_json::Value) -> Result<SampleData, ConnectorError> {
        let (authority, url) = Authority::from_url(endpoint, &["mqtt", "mqtts"], |scheme| {
            if scheme == "mqtts" {
                DEFAULT_TLS_PORT
            } else {
                DEFAULT_PORT
            }
        })?;
        let options = ConnectOptions::from_config(config)?;
        let tls = url.scheme() == "mqtts";

        let mut tcp = TcpStream::connect(authority.address()).await?;
        let session_present = if tls {
            let domain = ServerName::try_from(authority.host.clone())
                .map_err(|e| ConnectorError::InvalidEndpoint(format!("Invalid domain: {e}")))?;
            let mut stream = tls_connector()?.connect(domain, tcp).await?;
            handshake(&mut stream, &options).await?
        } else {
            handshake(&mut tcp, &options).await?
        };

        tracing::debug!(endpoint, client_id = %options.client_id, tls, "MQTT broker accepted connection");
        Ok(SampleData::new(
            format!("Connected to MQTT broker at {}", authority.address()),
            serde_json::json!({
                "broker": authority.host,
                "port": authority.port,
                "tls": tls,
                "clientId": options.client_id,
                "sessionPresent": session_present,
            }),
        ))
    }
}

#[async_trait]
impl Connector for MqttConnector {
    async fn test_reachability(
        &self,
        endpoint: &str,
        config: &serde_json::Value,
    ) -> Result<SampleData, ConnectorError> {
        with_timeout(self.timeout, self.run(endpoint, config)).await
    }
}
