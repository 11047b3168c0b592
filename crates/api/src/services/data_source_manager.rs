//! Data-source lifecycle: validate, persist, test, record status.
//!
//! [`DataSourceManager`] receives its store and connector registry at
//! construction. It keeps a cached list of data sources for duplicate-name
//! checks, loaded on start and reloaded after every mutation. The cache is
//! best-effort: the store's unique index on `lower(name)` is authoritative,
//! and a unique violation raised there is reported as the same duplicate-name
//! error the cache check produces.

use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use serde::Serialize;
use tagdeck_connectors::{ConnectorError, ConnectorRegistry, SampleData};
use tagdeck_core::data_source::{names_match, validate, DataSourceCandidate, DataSourceType};
use tagdeck_core::status::ConnectionStatus;
use tagdeck_core::types::{DbId, Timestamp};
use tagdeck_db::models::data_source::{CreateDataSource, DataSource, UpdateDataSource};
use tagdeck_db::store::DataSourceStore;
use tagdeck_db::StoreError;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    /// Every violation found, in check order.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("A data source named \"{0}\" already exists")]
    DuplicateName(String),

    #[error("Data source with id {0} not found")]
    NotFound(DbId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Connection test task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Outcome of a connection test, returned to the client as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionTestResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl From<Result<SampleData, ConnectorError>> for ConnectionTestResult {
    fn from(outcome: Result<SampleData, ConnectorError>) -> Self {
        match outcome {
            Ok(sample) => Self {
                success: true,
                message: sample.message,
                data: Some(sample.data),
            },
            Err(e) => Self {
                success: false,
                message: e.to_string(),
                data: None,
            },
        }
    }
}

/// Current time at the store's precision (microseconds).
fn stamp() -> Timestamp {
    Utc::now().trunc_subsecs(6)
}

/// A stamp strictly after `previous`, even if the clock has not advanced.
fn stamp_after(previous: Timestamp) -> Timestamp {
    let now = stamp();
    if now > previous {
        now
    } else {
        previous + chrono::Duration::microseconds(1)
    }
}

fn store_error(err: StoreError, name: &str) -> DataSourceError {
    if err.is_unique_violation() {
        DataSourceError::DuplicateName(name.to_string())
    } else {
        DataSourceError::Store(err)
    }
}

/// Canonical label for a type string that already passed validation.
fn canonical_type(raw: &str) -> String {
    raw.parse::<DataSourceType>()
        .map(|t| t.as_str().to_string())
        .unwrap_or_else(|_| raw.to_string())
}

pub struct DataSourceManager {
    store: Arc<dyn DataSourceStore>,
    connectors: ConnectorRegistry,
    cache: RwLock<Vec<DataSource>>,
}

impl DataSourceManager {
    /// Load the current data sources and return a handle that is safe to
    /// clone into Axum state.
    pub async fn start(
        store: Arc<dyn DataSourceStore>,
        connectors: ConnectorRegistry,
    ) -> Result<Arc<Self>, DataSourceError> {
        let initial = store.list().await?;
        tracing::info!(count = initial.len(), "Data-source cache loaded");
        Ok(Arc::new(Self {
            store,
            connectors,
            cache: RwLock::new(initial),
        }))
    }

    async fn refresh(&self) -> Result<(), DataSourceError> {
        let rows = self.store.list().await?;
        *self.cache.write().await = rows;
        Ok(())
    }

    async fn name_taken(&self, name: &str, except: Option<DbId>) -> bool {
        self.cache
            .read()
            .await
            .iter()
            .any(|ds| Some(ds.id) != except && names_match(&ds.name, name))
    }

    /// Cached data sources in byte order of name.
    pub async fn list(&self) -> Vec<DataSource> {
        self.cache.read().await.clone()
    }

    pub async fn get(&self, id: DbId) -> Result<DataSource, DataSourceError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(DataSourceError::NotFound(id))
    }

    /// Syntactic validation only; never touches the store or the network.
    pub fn validate(&self, candidate: &DataSourceCandidate<'_>) -> Vec<String> {
        validate(candidate)
    }

    /// Validate and insert a new data source with status `Disconnected`.
    pub async fn create(&self, input: &CreateDataSource) -> Result<DataSource, DataSourceError> {
        let violations = validate(&DataSourceCandidate::complete(
            &input.name,
            &input.source_type,
            &input.endpoint,
        ));
        if !violations.is_empty() {
            return Err(DataSourceError::Validation(violations));
        }

        let name = input.name.trim();
        if self.name_taken(name, None).await {
            return Err(DataSourceError::DuplicateName(name.to_string()));
        }

        let normalized = CreateDataSource {
            name: name.to_string(),
            source_type: canonical_type(&input.source_type),
            endpoint: input.endpoint.trim().to_string(),
            config: input.config.clone(),
        };
        let created = self
            .store
            .create(&normalized, ConnectionStatus::Disconnected)
            .await
            .map_err(|e| store_error(e, name))?;
        self.refresh().await?;

        tracing::info!(data_source_id = created.id, name = %created.name, source_type = %created.source_type, "Data source created");
        Ok(created)
    }

    /// Apply a partial update. Only the fields present are validated; an
    /// endpoint without a type is checked against the stored type, and a type
    /// without an endpoint against the stored endpoint.
    pub async fn update(
        &self,
        id: DbId,
        patch: &UpdateDataSource,
    ) -> Result<DataSource, DataSourceError> {
        let existing = self.get(id).await?;

        let effective_type = match (&patch.source_type, &patch.endpoint) {
            (Some(t), _) => Some(t.as_str()),
            (None, Some(_)) => Some(existing.source_type.as_str()),
            (None, None) => None,
        };
        let effective_endpoint = match (&patch.source_type, &patch.endpoint) {
            (Some(_), None) => Some(existing.endpoint.as_str()),
            (_, endpoint) => endpoint.as_deref(),
        };
        let violations = validate(&DataSourceCandidate {
            name: patch.name.as_deref(),
            source_type: effective_type,
            endpoint: effective_endpoint,
        });
        if !violations.is_empty() {
            return Err(DataSourceError::Validation(violations));
        }

        let name = patch.name.as_deref().map(str::trim);
        if let Some(name) = name {
            if self.name_taken(name, Some(id)).await {
                return Err(DataSourceError::DuplicateName(name.to_string()));
            }
        }

        let normalized = UpdateDataSource {
            name: name.map(str::to_string),
            source_type: patch.source_type.as_deref().map(canonical_type),
            endpoint: patch.endpoint.as_deref().map(|e| e.trim().to_string()),
            config: patch.config.clone(),
        };
        let updated = self
            .store
            .update(id, &normalized)
            .await
            .map_err(|e| store_error(e, name.unwrap_or(&existing.name)))?
            .ok_or(DataSourceError::NotFound(id))?;
        self.refresh().await?;

        tracing::info!(data_source_id = id, "Data source updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: DbId) -> Result<(), DataSourceError> {
        if !self.store.delete(id).await? {
            return Err(DataSourceError::NotFound(id));
        }
        self.refresh().await?;

        tracing::info!(data_source_id = id, "Data source deleted");
        Ok(())
    }

    async fn write_status(
        &self,
        id: DbId,
        status: ConnectionStatus,
        at: Timestamp,
    ) -> Result<DataSource, DataSourceError> {
        self.store
            .update_status(id, status, at)
            .await?
            .ok_or(DataSourceError::NotFound(id))
    }

    async fn run_test(
        &self,
        source_type: &str,
        endpoint: &str,
        config: &serde_json::Value,
    ) -> Result<SampleData, ConnectorError> {
        let kind = source_type
            .parse::<DataSourceType>()
            .map_err(|_| ConnectorError::Unsupported(source_type.to_string()))?;
        self.connectors.test(kind, endpoint, config).await
    }

    /// Test a saved data source and record the outcome.
    ///
    /// The status moves to `Connecting`, then to `Connected` or `Error`; each
    /// write stamps `last_update`, the second strictly after the first. A
    /// connector failure is recorded and returned as an unsuccessful result,
    /// never as an error.
    ///
    /// The test runs on its own task, so dropping the returned future (a
    /// client disconnect) does not leave the source stuck in `Connecting`.
    pub async fn test_connection(
        self: &Arc<Self>,
        id: DbId,
    ) -> Result<ConnectionTestResult, DataSourceError> {
        let ds = self.get(id).await?;
        let manager = Arc::clone(self);
        tokio::spawn(async move { manager.record_test(ds).await }).await?
    }

    async fn record_test(&self, ds: DataSource) -> Result<ConnectionTestResult, DataSourceError> {
        let id = ds.id;
        let started = stamp();
        self.write_status(id, ConnectionStatus::Connecting, started).await?;
        tracing::info!(data_source_id = id, source_type = %ds.source_type, endpoint = %ds.endpoint, "Testing data source connection");

        let result = ConnectionTestResult::from(
            self.run_test(&ds.source_type, &ds.endpoint, &ds.config).await,
        );

        let status = ConnectionStatus::from_outcome(result.success);
        self.write_status(id, status, stamp_after(started)).await?;
        self.refresh().await?;

        if result.success {
            tracing::info!(data_source_id = id, "Data source connection succeeded");
        } else {
            tracing::warn!(data_source_id = id, error = %result.message, "Data source connection failed");
        }
        Ok(result)
    }

    /// Test an unsaved configuration. Nothing is written.
    pub async fn test_candidate(
        &self,
        input: &CreateDataSource,
    ) -> Result<ConnectionTestResult, DataSourceError> {
        let violations = validate(&DataSourceCandidate::complete(
            &input.name,
            &input.source_type,
            &input.endpoint,
        ));
        if !violations.is_empty() {
            return Err(DataSourceError::Validation(violations));
        }

        let config = input
            .config
            .clone()
            .unwrap_or_else(|| serde_json::Value::Object(Default::default()));
        let outcome = self
            .run_test(&input.source_type, input.endpoint.trim(), &config)
            .await;
        Ok(ConnectionTestResult::from(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use async_trait::async_trait;
    use tagdeck_connectors::Connector;
    use tagdeck_db::store::MemoryDataSourceStore;

    struct Reachable;

    #[async_trait]
    impl Connector for Reachable {
        async fn test_reachability(
            &self,
            endpoint: &str,
            _config: &serde_json::Value,
        ) -> Result<SampleData, ConnectorError> {
            Ok(SampleData::new(
                format!("reached {endpoint}"),
                serde_json::json!({ "ok": true }),
            ))
        }
    }

    struct Unreachable;

    #[async_trait]
    impl Connector for Unreachable {
        async fn test_reachability(
            &self,
            _endpoint: &str,
            _config: &serde_json::Value,
        ) -> Result<SampleData, ConnectorError> {
            Err(ConnectorError::Io(std::io::Error::from(
                std::io::ErrorKind::ConnectionRefused,
            )))
        }
    }

    /// Answers after a delay longer than callers in these tests wait.
    struct Slow;

    #[async_trait]
    impl Connector for Slow {
        async fn test_reachability(
            &self,
            endpoint: &str,
            _config: &serde_json::Value,
        ) -> Result<SampleData, ConnectorError> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(SampleData::new(
                format!("reached {endpoint}"),
                serde_json::json!({ "ok": true }),
            ))
        }
    }

    fn registry() -> ConnectorRegistry {
        let mut registry = ConnectorRegistry::new();
        registry
            .register(DataSourceType::Mqtt, Arc::new(Reachable))
            .register(DataSourceType::Modbus, Arc::new(Unreachable))
            .register(DataSourceType::S7, Arc::new(Slow));
        registry
    }

    async fn manager() -> (Arc<DataSourceManager>, Arc<MemoryDataSourceStore>) {
        let store = Arc::new(MemoryDataSourceStore::new());
        let manager = DataSourceManager::start(store.clone(), registry())
            .await
            .unwrap();
        (manager, store)
    }

    fn input(name: &str, source_type: &str, endpoint: &str) -> CreateDataSource {
        CreateDataSource {
            name: name.to_string(),
            source_type: source_type.to_string(),
            endpoint: endpoint.to_string(),
            config: None,
        }
    }

    // -----------------------------------------------------------------------
    // create / update / delete
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn create_starts_disconnected_and_normalizes() {
        let (manager, _) = manager().await;
        let ds = manager
            .create(&input("  Broker  ", "mqtt", " mqtt://broker:1883 "))
            .await
            .unwrap();
        assert_eq!(ds.name, "Broker");
        assert_eq!(ds.source_type, "MQTT");
        assert_eq!(ds.endpoint, "mqtt://broker:1883");
        assert_eq!(ds.status, "Disconnected");
        assert_eq!(manager.list().await.len(), 1);
    }

    #[tokio::test]
    async fn create_reports_every_violation() {
        let (manager, _) = manager().await;
        let err = manager.create(&input("", "MQTT", "bad")).await.unwrap_err();
        let DataSourceError::Validation(violations) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(violations.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_names_are_case_insensitive() {
        let (manager, _) = manager().await;
        manager
            .create(&input("sensor1", "MQTT", "mqtt://a"))
            .await
            .unwrap();
        let err = manager
            .create(&input("Sensor1", "MQTT", "mqtt://b"))
            .await
            .unwrap_err();
        assert!(matches!(err, DataSourceError::DuplicateName(ref n) if n == "Sensor1"));
        assert_eq!(manager.list().await.len(), 1);
    }

    #[tokio::test]
    async fn backend_unique_violation_maps_to_duplicate_name() {
        let (manager, store) = manager().await;
        // Inserted behind the manager's back, so the cache does not know it.
        store
            .create(&input("plc", "Modbus", "10.0.0.1:502"), ConnectionStatus::Disconnected)
            .await
            .unwrap();

        let err = manager
            .create(&input("PLC", "Modbus", "10.0.0.2:502"))
            .await
            .unwrap_err();
        assert!(matches!(err, DataSourceError::DuplicateName(_)));
    }

    #[tokio::test]
    async fn endpoint_patch_is_checked_against_stored_type() {
        let (manager, _) = manager().await;
        let ds = manager
            .create(&input("plc", "Modbus", "10.0.0.1:502"))
            .await
            .unwrap();

        let patch = UpdateDataSource {
            endpoint: Some("mqtt://broker".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            manager.update(ds.id, &patch).await,
            Err(DataSourceError::Validation(_))
        ));

        let patch = UpdateDataSource {
            endpoint: Some("10.0.0.9:502".to_string()),
            ..Default::default()
        };
        let updated = manager.update(ds.id, &patch).await.unwrap();
        assert_eq!(updated.endpoint, "10.0.0.9:502");
    }

    #[tokio::test]
    async fn type_patch_is_checked_against_stored_endpoint() {
        let (manager, _) = manager().await;
        let ds = manager
            .create(&input("plc", "Modbus", "10.0.0.1:502"))
            .await
            .unwrap();

        let patch = UpdateDataSource {
            source_type: Some("OPC UA".to_string()),
            ..Default::default()
        };
        let err = manager.update(ds.id, &patch).await.unwrap_err();
        let DataSourceError::Validation(violations) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(violations, ["OPC UA endpoint must start with opc.tcp://"]);
        assert_eq!(manager.get(ds.id).await.unwrap().source_type, "Modbus");

        let patch = UpdateDataSource {
            source_type: Some("S7".to_string()),
            ..Default::default()
        };
        let updated = manager.update(ds.id, &patch).await.unwrap();
        assert_eq!(updated.source_type, "S7");
        assert_eq!(updated.endpoint, "10.0.0.1:502");
    }

    #[tokio::test]
    async fn rename_may_keep_own_name_but_not_take_another() {
        let (manager, _) = manager().await;
        let a = manager.create(&input("a", "MQTT", "mqtt://a")).await.unwrap();
        manager.create(&input("b", "MQTT", "mqtt://b")).await.unwrap();

        let own = UpdateDataSource {
            name: Some("A".to_string()),
            ..Default::default()
        };
        assert_eq!(manager.update(a.id, &own).await.unwrap().name, "A");

        let taken = UpdateDataSource {
            name: Some("B".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            manager.update(a.id, &taken).await,
            Err(DataSourceError::DuplicateName(_))
        ));
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let (manager, _) = manager().await;
        assert!(matches!(manager.delete(42).await, Err(DataSourceError::NotFound(42))));
        assert!(matches!(
            manager.update(42, &UpdateDataSource::default()).await,
            Err(DataSourceError::NotFound(42))
        ));
        assert!(matches!(
            manager.test_connection(42).await,
            Err(DataSourceError::NotFound(42))
        ));
    }

    // -----------------------------------------------------------------------
    // connection tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn failed_test_records_connecting_then_error() {
        let (manager, store) = manager().await;
        let ds = manager
            .create(&input("plc", "Modbus", "10.0.0.1:502"))
            .await
            .unwrap();

        let result = manager.test_connection(ds.id).await.unwrap();
        assert!(!result.success);
        assert!(result.message.starts_with("Connection failed"));
        assert!(result.data.is_none());

        let history = store.status_history(ds.id).await;
        let statuses: Vec<ConnectionStatus> = history.iter().map(|w| w.status).collect();
        assert_eq!(
            statuses,
            vec![
                ConnectionStatus::Disconnected,
                ConnectionStatus::Connecting,
                ConnectionStatus::Error
            ]
        );
        assert!(history[2].at > history[1].at);

        let saved = manager.get(ds.id).await.unwrap();
        assert_eq!(saved.status, "Error");
        assert_eq!(saved.last_update, Some(history[2].at));
    }

    #[tokio::test]
    async fn successful_test_records_connected() {
        let (manager, store) = manager().await;
        let ds = manager
            .create(&input("broker", "MQTT", "mqtt://broker"))
            .await
            .unwrap();

        let result = manager.test_connection(ds.id).await.unwrap();
        assert!(result.success);
        assert_eq!(result.message, "reached mqtt://broker");

        let last = store.status_history(ds.id).await.pop().unwrap();
        assert_eq!(last.status, ConnectionStatus::Connected);
        let cached = manager.list().await;
        assert_eq!(cached[0].status, "Connected");
    }

    #[tokio::test]
    async fn missing_connector_is_a_failed_result() {
        let (manager, store) = manager().await;
        let ds = manager
            .create(&input("ws", "WebSocket", "ws://h"))
            .await
            .unwrap();

        let result = manager.test_connection(ds.id).await.unwrap();
        assert!(!result.success);
        assert!(result.message.contains("WebSocket"));
        let last = store.status_history(ds.id).await.pop().unwrap();
        assert_eq!(last.status, ConnectionStatus::Error);
    }

    #[tokio::test]
    async fn abandoned_test_still_records_outcome() {
        let (manager, store) = manager().await;
        let ds = manager
            .create(&input("press", "S7", "10.0.0.9:102"))
            .await
            .unwrap();

        let abandoned =
            tokio::time::timeout(Duration::from_millis(50), manager.test_connection(ds.id)).await;
        assert!(abandoned.is_err());

        let mut status = ConnectionStatus::Connecting;
        for _ in 0..40 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            status = store.status_history(ds.id).await.pop().unwrap().status;
            if status != ConnectionStatus::Connecting {
                break;
            }
        }
        assert_eq!(status, ConnectionStatus::Connected);
        assert_eq!(manager.get(ds.id).await.unwrap().status, "Connected");
    }

    #[tokio::test]
    async fn candidate_test_writes_nothing() {
        let (manager, _) = manager().await;
        let result = manager
            .test_candidate(&input("broker", "MQTT", "mqtt://broker"))
            .await
            .unwrap();
        assert!(result.success);
        assert!(manager.list().await.is_empty());

        assert!(matches!(
            manager.test_candidate(&input("x", "MQTT", "http://nope")).await,
            Err(DataSourceError::Validation(_))
        ));
    }

    #[test]
    fn stamp_after_is_strictly_later() {
        let now = stamp();
        let later = stamp_after(now + chrono::Duration::seconds(5));
        assert!(later > now + chrono::Duration::seconds(5));
    }
}
