use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tagdeck_core::types::{DbId, Timestamp};

/// A row from the `groups` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Group {
    pub id: DbId,
    pub name: String,
    pub expanded: bool,
    pub parent_id: Option<DbId>,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGroup {
    pub name: String,
    pub expanded: Option<bool>,
    pub parent_id: Option<DbId>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateGroup {
    pub name: Option<String>,
    pub expanded: Option<bool>,
    pub parent_id: Option<DbId>,
    pub description: Option<String>,
}
