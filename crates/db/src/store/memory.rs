use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tagdeck_core::data_source::names_match;
use tagdeck_core::status::ConnectionStatus;
use tagdeck_core::types::{DbId, Timestamp};
use tokio::sync::Mutex;

use super::{DataSourceStore, DATA_SOURCE_NAME_CONSTRAINT};
use crate::error::StoreError;
use crate::models::data_source::{CreateDataSource, DataSource, UpdateDataSource};

/// One recorded status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusWrite {
    pub id: DbId,
    pub status: ConnectionStatus,
    pub at: Timestamp,
}

#[derive(Default)]
struct Inner {
    next_id: DbId,
    rows: BTreeMap<DbId, DataSource>,
    status_log: Vec<StatusWrite>,
}

impl Inner {
    fn name_taken(&self, name: &str, except: Option<DbId>) -> bool {
        self.rows
            .values()
            .any(|row| Some(row.id) != except && names_match(&row.name, name))
    }
}

/// In-process [`DataSourceStore`].
///
/// Mirrors the Postgres behaviour the manager relies on: byte-ordered
/// listing and the case-insensitive unique name index. Every status write is
/// also appended to a log that tests can inspect.
#[derive(Default)]
pub struct MemoryDataSourceStore {
    inner: Mutex<Inner>,
}

impl MemoryDataSourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status writes for `id`, oldest first. Includes the initial status set
    /// on creation.
    pub async fn status_history(&self, id: DbId) -> Vec<StatusWrite> {
        let inner = self.inner.lock().await;
        inner
            .status_log
            .iter()
            .filter(|write| write.id == id)
            .copied()
            .collect()
    }
}

fn unique_violation() -> StoreError {
    StoreError::UniqueViolation {
        constraint: DATA_SOURCE_NAME_CONSTRAINT.to_string(),
    }
}

#[async_trait]
impl DataSourceStore for MemoryDataSourceStore {
    async fn list(&self) -> Result<Vec<DataSource>, StoreError> {
        let inner = self.inner.lock().await;
        let mut rows: Vec<DataSource> = inner.rows.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<DataSource>, StoreError> {
        Ok(self.inner.lock().await.rows.get(&id).cloned())
    }

    async fn create(
        &self,
        input: &CreateDataSource,
        status: ConnectionStatus,
    ) -> Result<DataSource, StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.name_taken(&input.name, None) {
            return Err(unique_violation());
        }

        inner.next_id += 1;
        let now = Utc::now();
        let row = DataSource {
            id: inner.next_id,
            name: input.name.clone(),
            source_type: input.source_type.clone(),
            endpoint: input.endpoint.clone(),
            status: status.as_str().to_string(),
            config: input
                .config
                .clone()
                .unwrap_or_else(|| serde_json::Value::Object(Default::default())),
            last_update: None,
            created_at: now,
            updated_at: now,
        };
        inner.status_log.push(StatusWrite {
            id: row.id,
            status,
            at: now,
        });
        inner.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        id: DbId,
        input: &UpdateDataSource,
    ) -> Result<Option<DataSource>, StoreError> {
        let mut inner = self.inner.lock().await;
        if let Some(name) = &input.name {
            if inner.name_taken(name, Some(id)) {
                return Err(unique_violation());
            }
        }

        let Some(row) = inner.rows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &input.name {
            row.name = name.clone();
        }
        if let Some(source_type) = &input.source_type {
            row.source_type = source_type.clone();
        }
        if let Some(endpoint) = &input.endpoint {
            row.endpoint = endpoint.clone();
        }
        if let Some(config) = &input.config {
            row.config = config.clone();
        }
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn update_status(
        &self,
        id: DbId,
        status: ConnectionStatus,
        at: Timestamp,
    ) -> Result<Option<DataSource>, StoreError> {
        let mut inner = self.inner.lock().await;
        let Some(row) = inner.rows.get_mut(&id) else {
            return Ok(None);
        };
        row.status = status.as_str().to_string();
        row.last_update = Some(at);
        row.updated_at = Utc::now();
        let updated = row.clone();
        inner.status_log.push(StatusWrite { id, status, at });
        Ok(Some(updated))
    }

    async fn delete(&self, id: DbId) -> Result<bool, StoreError> {
        Ok(self.inner.lock().await.rows.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str) -> CreateDataSource {
        CreateDataSource {
            name: name.to_string(),
            source_type: "MQTT".to_string(),
            endpoint: "mqtt://broker:1883".to_string(),
            config: None,
        }
    }

    #[tokio::test]
    async fn rejects_case_insensitive_duplicate() {
        let store = MemoryDataSourceStore::new();
        store
            .create(&input("sensor1"), ConnectionStatus::Disconnected)
            .await
            .unwrap();

        let err = store
            .create(&input("Sensor1"), ConnectionStatus::Disconnected)
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn rename_to_own_name_in_other_case_is_allowed() {
        let store = MemoryDataSourceStore::new();
        let row = store
            .create(&input("plc-a"), ConnectionStatus::Disconnected)
            .await
            .unwrap();

        let patch = UpdateDataSource {
            name: Some("PLC-A".to_string()),
            ..Default::default()
        };
        let updated = store.update(row.id, &patch).await.unwrap().unwrap();
        assert_eq!(updated.name, "PLC-A");
    }

    #[tokio::test]
    async fn lists_in_byte_order() {
        let store = MemoryDataSourceStore::new();
        for name in ["beta", "Alpha", "alpha2"] {
            store
                .create(&input(name), ConnectionStatus::Disconnected)
                .await
                .unwrap();
        }
        let names: Vec<String> = store.list().await.unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Alpha", "alpha2", "beta"]);
    }

    #[tokio::test]
    async fn status_writes_are_logged() {
        let store = MemoryDataSourceStore::new();
        let row = store
            .create(&input("line"), ConnectionStatus::Disconnected)
            .await
            .unwrap();
        let at = Utc::now();
        let updated = store
            .update_status(row.id, ConnectionStatus::Connecting, at)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.status, "Connecting");
        assert_eq!(updated.last_update, Some(at));
        let history: Vec<ConnectionStatus> = store
            .status_history(row.id)
            .await
            .into_iter()
            .map(|w| w.status)
            .collect();
        assert_eq!(
            history,
            vec![ConnectionStatus::Disconnected, ConnectionStatus::Connecting]
        );
    }

    #[tokio::test]
    async fn missing_rows_report_none_and_false() {
        let store = MemoryDataSourceStore::new();
        assert!(store.find_by_id(9).await.unwrap().is_none());
        assert!(store
            .update_status(9, ConnectionStatus::Error, Utc::now())
            .await
            .unwrap()
            .is_none());
        assert!(!store.delete(9).await.unwrap());
    }
}
