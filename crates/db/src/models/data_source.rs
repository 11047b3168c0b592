//! Data-source model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tagdeck_core::types::{DbId, Timestamp};

/// A row from the `data_sources` table.
///
/// `config` holds per-type settings (auth, headers, unit id, rack/slot...)
/// and is passed through to the connector untouched.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct DataSource {
    pub id: DbId,
    pub name: String,
    pub source_type: String,
    pub endpoint: String,
    pub status: String,
    pub config: serde_json::Value,
    /// Stamped on every status transition.
    pub last_update: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a data source. `status` is set by the manager.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDataSource {
    pub name: String,
    pub source_type: String,
    pub endpoint: String,
    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

/// DTO for a partial data-source update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDataSource {
    pub name: Option<String>,
    pub source_type: Option<String>,
    pub endpoint: Option<String>,
    pub config: Option<serde_json::Value>,
}
