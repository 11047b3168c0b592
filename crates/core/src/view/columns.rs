//! Column layout of the tag table.

use serde::{Deserialize, Serialize};

/// One column of the tag table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Field key; matches the sort keys.
    pub key: String,
    pub label: String,
    pub visible: bool,
    pub width: u32,
    pub min_width: u32,
}

impl ColumnDef {
    fn new(key: &str, label: &str, width: u32, min_width: u32) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            visible: true,
            width,
            min_width,
        }
    }
}

/// Ordered column descriptors. Order never changes through toggling or resizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnLayout {
    columns: Vec<ColumnDef>,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            columns: vec![
                ColumnDef::new("name", "Name", 180, 100),
                ColumnDef::new("data_type", "Type", 100, 70),
                ColumnDef::new("address", "Address", 140, 90),
                ColumnDef::new("value", "Value", 120, 70),
                ColumnDef::new("comment", "Comment", 220, 120),
                ColumnDef::new("group_name", "Group", 140, 90),
                ColumnDef::new("active", "Active", 80, 60),
                ColumnDef::new("retain", "Retain", 80, 60),
                ColumnDef::new("data_source", "Data Source", 120, 90),
                ColumnDef::new("connection_status", "Status", 120, 90),
            ],
        }
    }
}

impl ColumnLayout {
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn get(&self, key: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Visible columns in layout order.
    pub fn visible(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| c.visible)
    }

    /// Flip the visibility of `key`. Returns `false` for an unknown key.
    pub fn toggle(&mut self, key: &str) -> bool {
        match self.columns.iter_mut().find(|c| c.key == key) {
            Some(column) => {
                column.visible = !column.visible;
                true
            }
            None => false,
        }
    }

    /// Set the width of `key`, clamped to its minimum. Returns the applied
    /// width, or `None` for an unknown key.
    pub fn resize(&mut self, key: &str, width: u32) -> Option<u32> {
        let column = self.columns.iter_mut().find(|c| c.key == key)?;
        column.width = width.max(column.min_width);
        Some(column.width)
    }
}
