//! Stable column sorting of the tag table.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::TagRecord;
use crate::types::Timestamp;

/// Sortable tag columns. Keys match the column layout keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Name,
    DataType,
    Address,
    Value,
    Comment,
    GroupName,
    Active,
    Retain,
    DataSource,
    ConnectionStatus,
    Multiplier,
    UpdateInterval,
    CreatedAt,
    UpdatedAt,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::DataType => "data_type",
            Self::Address => "address",
            Self::Value => "value",
            Self::Comment => "comment",
            Self::GroupName => "group_name",
            Self::Active => "active",
            Self::Retain => "retain",
            Self::DataSource => "data_source",
            Self::ConnectionStatus => "connection_status",
            Self::Multiplier => "multiplier",
            Self::UpdateInterval => "update_interval",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = match s {
            "name" => Self::Name,
            "data_type" => Self::DataType,
            "address" => Self::Address,
            "value" => Self::Value,
            "comment" => Self::Comment,
            "group_name" => Self::GroupName,
            "active" => Self::Active,
            "retain" => Self::Retain,
            "data_source" => Self::DataSource,
            "connection_status" => Self::ConnectionStatus,
            "multiplier" => Self::Multiplier,
            "update_interval" => Self::UpdateInterval,
            "created_at" => Self::CreatedAt,
            "updated_at" => Self::UpdatedAt,
            other => return Err(format!("Unknown sort key: {other}")),
        };
        Ok(key)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("Sort direction must be asc or desc, got {other}")),
        }
    }
}

/// Current sort of the tag table. `key: None` means "as loaded".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    pub key: Option<SortKey>,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortConfig {
    pub fn by(key: SortKey, direction: SortDirection) -> Self {
        Self {
            key: Some(key),
            direction,
        }
    }

    /// Column-header click: same key flips direction, a new key sorts ascending.
    pub fn request(self, key: SortKey) -> Self {
        match self.key {
            Some(current) if current == key => Self::by(key, self.direction.reversed()),
            _ => Self::by(key, SortDirection::Asc),
        }
    }
}

/// A field value with its natural ordering. Missing values sort first.
#[derive(Debug, Clone, Copy, PartialEq)]
enum SortValue<'a> {
    Missing,
    Flag(bool),
    Number(f64),
    Text(&'a str),
    Time(Timestamp),
}

impl SortValue<'_> {
    fn rank(&self) -> u8 {
        match self {
            Self::Missing => 0,
            Self::Flag(_) => 1,
            Self::Number(_) => 2,
            Self::Text(_) => 3,
            Self::Time(_) => 4,
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Flag(a), Self::Flag(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Time(a), Self::Time(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

fn text(value: Option<&str>) -> SortValue<'_> {
    value.map_or(SortValue::Missing, SortValue::Text)
}

fn sort_value<T: TagRecord>(tag: &T, key: SortKey) -> SortValue<'_> {
    match key {
        SortKey::Name => SortValue::Text(tag.name()),
        SortKey::DataType => SortValue::Text(tag.data_type()),
        SortKey::Address => text(tag.address()),
        SortKey::Value => text(tag.value()),
        SortKey::Comment => text(tag.comment()),
        SortKey::GroupName => text(tag.group_name()),
        SortKey::Active => SortValue::Flag(tag.active()),
        SortKey::Retain => SortValue::Flag(tag.retain()),
        SortKey::DataSource => SortValue::Text(tag.data_source()),
        SortKey::ConnectionStatus => SortValue::Text(tag.connection_status()),
        SortKey::Multiplier => tag.multiplier().map_or(SortValue::Missing, SortValue::Number),
        SortKey::UpdateInterval => text(tag.update_interval()),
        SortKey::CreatedAt => tag.created_at().map_or(SortValue::Missing, SortValue::Time),
        SortKey::UpdatedAt => tag.updated_at().map_or(SortValue::Missing, SortValue::Time),
    }
}

/// Sort `tags` by `config`.
///
/// Uses a stable sort: tags with equal keys keep their input order in both
/// directions. With no key the input is returned unchanged.
pub fn sort_tags<T: TagRecord>(mut tags: Vec<T>, config: &SortConfig) -> Vec<T> {
    let Some(key) = config.key else {
        return tags;
    };
    tags.sort_by(|a, b| {
        let ordering = sort_value(a, key).compare(&sort_value(b, key));
        match config.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    tags
}
