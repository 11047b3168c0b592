use async_trait::async_trait;
use tagdeck_core::status::ConnectionStatus;
use tagdeck_core::types::{DbId, Timestamp};

use super::DataSourceStore;
use crate::error::StoreError;
use crate::models::data_source::{CreateDataSource, DataSource, UpdateDataSource};
use crate::repositories::DataSourceRepo;
use crate::DbPool;

/// [`DataSourceStore`] backed by the `data_sources` table.
#[derive(Clone)]
pub struct PgDataSourceStore {
    pool: DbPool,
}

impl PgDataSourceStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DataSourceStore for PgDataSourceStore {
    async fn list(&self) -> Result<Vec<DataSource>, StoreError> {
        Ok(DataSourceRepo::list(&self.pool).await?)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<DataSource>, StoreError> {
        Ok(DataSourceRepo::find_by_id(&self.pool, id).await?)
    }

    async fn create(
        &self,
        input: &CreateDataSource,
        status: ConnectionStatus,
    ) -> Result<DataSource, StoreError> {
        Ok(DataSourceRepo::create(&self.pool, input, status.as_str()).await?)
    }

    async fn update(
        &self,
        id: DbId,
        input: &UpdateDataSource,
    ) -> Result<Option<DataSource>, StoreError> {
        Ok(DataSourceRepo::update(&self.pool, id, input).await?)
    }

    async fn update_status(
        &self,
        id: DbId,
        status: ConnectionStatus,
        at: Timestamp,
    ) -> Result<Option<DataSource>, StoreError> {
        Ok(DataSourceRepo::update_status(&self.pool, id, status.as_str(), at).await?)
    }

    async fn delete(&self, id: DbId) -> Result<bool, StoreError> {
        Ok(DataSourceRepo::delete(&self.pool, id).await?)
    }
}
