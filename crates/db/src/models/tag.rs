//! Tag model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tagdeck_core::import::TagDraft;
use tagdeck_core::types::{DbId, Timestamp};
use tagdeck_core::view::TagRecord;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `tags` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Tag {
    pub id: DbId,
    pub name: String,
    pub comment: Option<String>,
    pub group_name: Option<String>,
    pub data_type: String,
    pub address: Option<String>,
    pub value: Option<String>,
    pub active: bool,
    pub retain: bool,
    pub data_source: String,
    pub mqtt_path: Option<String>,
    pub opc_node_id: Option<String>,
    pub modbus_register: Option<String>,
    pub device_id: Option<String>,
    pub multiplier: Option<f64>,
    pub update_interval: String,
    pub direct_logging: bool,
    pub log_duration: Option<String>,
    pub alarm_enabled: bool,
    pub alarm_high_limit: Option<f64>,
    pub alarm_low_limit: Option<f64>,
    pub connection_status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TagRecord for Tag {
    fn id(&self) -> DbId {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
    fn data_type(&self) -> &str {
        &self.data_type
    }
    fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }
    fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
    fn group_name(&self) -> Option<&str> {
        self.group_name.as_deref()
    }
    fn active(&self) -> bool {
        self.active
    }
    fn retain(&self) -> bool {
        self.retain
    }
    fn data_source(&self) -> &str {
        &self.data_source
    }
    fn connection_status(&self) -> &str {
        &self.connection_status
    }
    fn multiplier(&self) -> Option<f64> {
        self.multiplier
    }
    fn update_interval(&self) -> Option<&str> {
        Some(&self.update_interval)
    }
    fn created_at(&self) -> Option<Timestamp> {
        Some(self.created_at)
    }
    fn updated_at(&self) -> Option<Timestamp> {
        Some(self.updated_at)
    }
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// DTO for creating a tag. Omitted optional flags take the column defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTag {
    pub name: String,
    pub data_type: String,
    pub comment: Option<String>,
    pub group_name: Option<String>,
    pub address: Option<String>,
    pub value: Option<String>,
    pub active: Option<bool>,
    pub retain: Option<bool>,
    pub data_source: Option<String>,
    pub mqtt_path: Option<String>,
    pub opc_node_id: Option<String>,
    pub modbus_register: Option<String>,
    pub device_id: Option<String>,
    pub multiplier: Option<f64>,
    pub update_interval: Option<String>,
    pub direct_logging: Option<bool>,
    pub log_duration: Option<String>,
    pub alarm_enabled: Option<bool>,
    pub alarm_high_limit: Option<f64>,
    pub alarm_low_limit: Option<f64>,
    pub connection_status: Option<String>,
}

impl From<TagDraft> for CreateTag {
    fn from(draft: TagDraft) -> Self {
        Self {
            name: draft.name,
            data_type: draft.data_type.as_str().to_string(),
            comment: draft.comment,
            group_name: draft.group_name,
            address: draft.address,
            value: draft.value,
            active: Some(draft.active),
            retain: Some(draft.retain),
            data_source: Some(draft.data_source.as_str().to_string()),
            connection_status: Some(draft.connection_status.as_str().to_string()),
            ..Default::default()
        }
    }
}

/// DTO for a partial tag update. Only `Some` fields are written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTag {
    pub name: Option<String>,
    pub data_type: Option<String>,
    pub comment: Option<String>,
    pub group_name: Option<String>,
    pub address: Option<String>,
    pub value: Option<String>,
    pub active: Option<bool>,
    pub retain: Option<bool>,
    pub data_source: Option<String>,
    pub mqtt_path: Option<String>,
    pub opc_node_id: Option<String>,
    pub modbus_register: Option<String>,
    pub device_id: Option<String>,
    pub multiplier: Option<f64>,
    pub update_interval: Option<String>,
    pub direct_logging: Option<bool>,
    pub log_duration: Option<String>,
    pub alarm_enabled: Option<bool>,
    pub alarm_high_limit: Option<f64>,
    pub alarm_low_limit: Option<f64>,
    pub connection_status: Option<String>,
}
