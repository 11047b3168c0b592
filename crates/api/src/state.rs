use std::sync::Arc;

use crate::config::ServerConfig;
use crate::services::DataSourceManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every field is a pool handle or an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (tags and groups).
    pub pool: tagdeck_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Data-source validation, persistence and connection testing.
    pub data_sources: Arc<DataSourceManager>,
}
