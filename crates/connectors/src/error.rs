use std::time::Duration;

/// Failure of a single reachability test.
///
/// Every variant renders a message fit for the data-source UI.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    /// The HTTP request itself failed (network, DNS, TLS).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Endpoint returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Connection timed out after {} s", .0.as_secs())]
    Timeout(Duration),

    /// The response body was not the structured payload the protocol expects.
    #[error("Invalid response body: {0}")]
    InvalidBody(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Connection failed: {0}")]
    Io(#[from] std::io::Error),

    /// The peer answered but refused or broke the handshake.
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("WebSocket handshake failed: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// No connector is registered for the data-source type.
    #[error("No connector registered for {0}")]
    Unsupported(String),
}
