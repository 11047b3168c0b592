//! Tag vocabulary and validation.
//!
//! `DataType` and `TagSource` are the canonical enums for a tag's declared
//! type and binding. The legacy UI spellings (`Int16`, `Int32`, `OPC`) are
//! accepted on input and mapped onto the canonical variants; they are never
//! written back.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Value used by the type and group filters to mean "no restriction".
pub const FILTER_ALL: &str = "All";

/// Default polling interval token for newly created tags.
pub const DEFAULT_UPDATE_INTERVAL: &str = "1s";

static UPDATE_INTERVAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(ms|s|m|h)$").expect("valid regex"));

// ---------------------------------------------------------------------------
// DataType
// ---------------------------------------------------------------------------

/// Declared PLC data type of a tag. The stored `value` is text regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Bool,
    Byte,
    Word,
    DWord,
    Int,
    DInt,
    Real,
    String,
}

impl DataType {
    pub const ALL: [DataType; 8] = [
        Self::Bool,
        Self::Byte,
        Self::Word,
        Self::DWord,
        Self::Int,
        Self::DInt,
        Self::Real,
        Self::String,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::Byte => "Byte",
            Self::Word => "Word",
            Self::DWord => "DWord",
            Self::Int => "Int",
            Self::DInt => "DInt",
            Self::Real => "Real",
            Self::String => "String",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Bool" => Ok(Self::Bool),
            "Byte" => Ok(Self::Byte),
            "Word" => Ok(Self::Word),
            "DWord" => Ok(Self::DWord),
            "Int" | "Int16" => Ok(Self::Int),
            "DInt" | "Int32" => Ok(Self::DInt),
            "Real" => Ok(Self::Real),
            "String" => Ok(Self::String),
            other => Err(format!("Unknown data type: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// TagSource
// ---------------------------------------------------------------------------

/// Where a tag's value comes from.
///
/// Independent of the `data_sources` table: a tag names its protocol, not a
/// specific configured connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagSource {
    Internal,
    #[serde(rename = "MQTT")]
    Mqtt,
    #[serde(rename = "OPC UA", alias = "OPC")]
    OpcUa,
    Modbus,
    #[serde(rename = "HTTPS")]
    Https,
}

impl TagSource {
    pub const ALL: [TagSource; 5] = [
        Self::Internal,
        Self::Mqtt,
        Self::OpcUa,
        Self::Modbus,
        Self::Https,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "Internal",
            Self::Mqtt => "MQTT",
            Self::OpcUa => "OPC UA",
            Self::Modbus => "Modbus",
            Self::Https => "HTTPS",
        }
    }
}

impl fmt::Display for TagSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Internal" => Ok(Self::Internal),
            "MQTT" => Ok(Self::Mqtt),
            "OPC UA" | "OPC" => Ok(Self::OpcUa),
            "Modbus" => Ok(Self::Modbus),
            "HTTPS" => Ok(Self::Https),
            other => Err(format!("Unknown tag data source: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Update interval
// ---------------------------------------------------------------------------

/// Parse an update interval token such as `"500ms"`, `"1s"`, `"5m"` or `"1h"`.
///
/// Returns `None` for malformed tokens and for zero durations.
pub fn parse_update_interval(token: &str) -> Option<Duration> {
    let caps = UPDATE_INTERVAL_RE.captures(token.trim())?;
    let amount: u64 = caps[1].parse().ok()?;
    if amount == 0 {
        return None;
    }
    let duration = match &caps[2] {
        "ms" => Duration::from_millis(amount),
        "s" => Duration::from_secs(amount),
        "m" => Duration::from_secs(amount.checked_mul(60)?),
        "h" => Duration::from_secs(amount.checked_mul(3600)?),
        _ => return None,
    };
    Some(duration)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// The validated subset of a tag create payload or patch.
///
/// `None` means "not present in this payload"; only present fields are
/// checked, so the same rules serve creates and partial updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct TagCandidate<'a> {
    pub name: Option<&'a str>,
    pub data_type: Option<&'a str>,
    pub data_source: Option<&'a str>,
    pub update_interval: Option<&'a str>,
    pub multiplier: Option<f64>,
    pub alarm_low_limit: Option<f64>,
    pub alarm_high_limit: Option<f64>,
}

/// Validate a tag candidate, returning every violation found.
///
/// An empty result means the candidate is valid. Checks never stop at the
/// first failure.
pub fn validate_tag(candidate: &TagCandidate<'_>) -> Vec<String> {
    let mut violations = Vec::new();

    if let Some(name) = candidate.name {
        if name.trim().is_empty() {
            violations.push("Tag name is required".to_string());
        }
    }

    if let Some(data_type) = candidate.data_type {
        if data_type.parse::<DataType>().is_err() {
            violations.push(format!(
                "Data type must be one of {}, got \"{data_type}\"",
                join_labels(DataType::ALL.iter().map(DataType::as_str))
            ));
        }
    }

    if let Some(source) = candidate.data_source {
        if source.parse::<TagSource>().is_err() {
            violations.push(format!(
                "Data source must be one of {}, got \"{source}\"",
                join_labels(TagSource::ALL.iter().map(TagSource::as_str))
            ));
        }
    }

    if let Some(interval) = candidate.update_interval {
        if parse_update_interval(interval).is_none() {
            violations.push(format!(
                "Update interval must look like 500ms, 1s, 5m or 1h, got \"{interval}\""
            ));
        }
    }

    if let Some(multiplier) = candidate.multiplier {
        if !multiplier.is_finite() {
            violations.push("Multiplier must be a finite number".to_string());
        }
    }

    if let (Some(low), Some(high)) = (candidate.alarm_low_limit, candidate.alarm_high_limit) {
        if low > high {
            violations.push(format!(
                "Alarm low limit ({low}) must not exceed alarm high limit ({high})"
            ));
        }
    }

    violations
}

fn join_labels<'a>(labels: impl Iterator<Item = &'a str>) -> String {
    labels.collect::<Vec<_>>().join(", ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
