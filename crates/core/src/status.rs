//! Connection status shared by tags and data sources.
//!
//! Stored as text in `tags.connection_status` and `data_sources.status`.
//! The label is a best-effort "last observed" value, never a live state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Last observed health of a tag binding or data-source connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Connecting,
    Error,
}

impl ConnectionStatus {
    pub const ALL: [ConnectionStatus; 4] = [
        Self::Connected,
        Self::Disconnected,
        Self::Connecting,
        Self::Error,
    ];

    /// Label stored in the database and shown in the UI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connected => "Connected",
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Error => "Error",
        }
    }

    /// Status recorded after a connection attempt finishes.
    pub fn from_outcome(success: bool) -> Self {
        if success {
            Self::Connected
        } else {
            Self::Error
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionStatus {
    type Err = String;

    /// Accepts the canonical labels plus the legacy `active` / `inactive` /
    /// `error` vocabulary.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Connected" | "active" => Ok(Self::Connected),
            "Disconnected" | "inactive" => Ok(Self::Disconnected),
            "Connecting" => Ok(Self::Connecting),
            "Error" | "error" => Ok(Self::Error),
            other => Err(format!("Unknown connection status: {other}")),
        }
    }
}
