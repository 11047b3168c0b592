//! Repository for the `data_sources` table.

use sqlx::PgPool;
use tagdeck_core::types::{DbId, Timestamp};

use crate::models::data_source::{CreateDataSource, DataSource, UpdateDataSource};

const COLUMNS: &str = "\
    id, name, source_type, endpoint, status, config, last_update, created_at, updated_at";

/// Provides CRUD and status operations for data sources.
pub struct DataSourceRepo;

impl DataSourceRepo {
    pub async fn list(pool: &PgPool) -> Result<Vec<DataSource>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM data_sources ORDER BY name COLLATE \"C\", id");
        sqlx::query_as::<_, DataSource>(&query).fetch_all(pool).await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<DataSource>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM data_sources WHERE id = $1");
        sqlx::query_as::<_, DataSource>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a data source with the given initial `status`.
    ///
    /// A case-insensitive duplicate name fails on `uq_data_sources_name_lower`.
    pub async fn create(
        pool: &PgPool,
        input: &CreateDataSource,
        status: &str,
    ) -> Result<DataSource, sqlx::Error> {
        let query = format!(
            "INSERT INTO data_sources (name, source_type, endpoint, status, config) \
             VALUES ($1, $2, $3, $4, COALESCE($5, '{{}}'::jsonb)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DataSource>(&query)
            .bind(&input.name)
            .bind(&input.source_type)
            .bind(&input.endpoint)
            .bind(status)
            .bind(&input.config)
            .fetch_one(pool)
            .await
    }

    /// Apply the non-`None` fields of `input`. Returns `None` for an unknown id.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateDataSource,
    ) -> Result<Option<DataSource>, sqlx::Error> {
        let query = format!(
            "UPDATE data_sources SET \
                name = COALESCE($2, name), \
                source_type = COALESCE($3, source_type), \
                endpoint = COALESCE($4, endpoint), \
                config = COALESCE($5, config) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DataSource>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.source_type)
            .bind(&input.endpoint)
            .bind(&input.config)
            .fetch_optional(pool)
            .await
    }

    /// Record a status transition together with its timestamp.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
        at: Timestamp,
    ) -> Result<Option<DataSource>, sqlx::Error> {
        let query = format!(
            "UPDATE data_sources SET status = $2, last_update = $3 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DataSource>(&query)
            .bind(id)
            .bind(status)
            .bind(at)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM data_sources WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
