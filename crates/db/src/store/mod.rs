//! Storage seam for data sources.
//!
//! The data-source manager talks to a `dyn DataSourceStore` so it can be
//! exercised without a database. [`PgDataSourceStore`] delegates to
//! [`DataSourceRepo`](crate::repositories::DataSourceRepo);
//! [`MemoryDataSourceStore`] keeps rows in process and enforces the same
//! case-insensitive name index.

mod memory;
mod postgres;

use async_trait::async_trait;
use tagdeck_core::status::ConnectionStatus;
use tagdeck_core::types::{DbId, Timestamp};

use crate::error::StoreError;
use crate::models::data_source::{CreateDataSource, DataSource, UpdateDataSource};

pub use memory::{MemoryDataSourceStore, StatusWrite};
pub use postgres::PgDataSourceStore;

/// Name of the unique index on `lower(name)`.
pub const DATA_SOURCE_NAME_CONSTRAINT: &str = "uq_data_sources_name_lower";

#[async_trait]
pub trait DataSourceStore: Send + Sync {
    /// All data sources ordered by name in byte order.
    async fn list(&self) -> Result<Vec<DataSource>, StoreError>;

    async fn find_by_id(&self, id: DbId) -> Result<Option<DataSource>, StoreError>;

    async fn create(
        &self,
        input: &CreateDataSource,
        status: ConnectionStatus,
    ) -> Result<DataSource, StoreError>;

    async fn update(
        &self,
        id: DbId,
        input: &UpdateDataSource,
    ) -> Result<Option<DataSource>, StoreError>;

    async fn update_status(
        &self,
        id: DbId,
        status: ConnectionStatus,
        at: Timestamp,
    ) -> Result<Option<DataSource>, StoreError>;

    async fn delete(&self, id: DbId) -> Result<bool, StoreError>;
}
