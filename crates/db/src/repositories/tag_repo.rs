//! Repository for the `tags` table.

use std::collections::BTreeSet;

use sqlx::PgPool;
use tagdeck_core::types::DbId;

use crate::models::tag::{CreateTag, Tag, UpdateTag};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "\
    id, name, comment, group_name, data_type, address, value, active, retain, \
    data_source, mqtt_path, opc_node_id, modbus_register, device_id, multiplier, \
    update_interval, direct_logging, log_duration, alarm_enabled, alarm_high_limit, \
    alarm_low_limit, connection_status, created_at, updated_at";

const INSERT: &str = "\
    INSERT INTO tags \
        (name, data_type, comment, group_name, address, value, active, retain, \
         data_source, mqtt_path, opc_node_id, modbus_register, device_id, multiplier, \
         update_interval, direct_logging, log_duration, alarm_enabled, \
         alarm_high_limit, alarm_low_limit, connection_status) \
    VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, true), COALESCE($8, false), \
            COALESCE($9, 'Internal'), $10, $11, $12, $13, $14, \
            COALESCE($15, '1s'), COALESCE($16, false), $17, COALESCE($18, false), \
            $19, $20, COALESCE($21, 'Disconnected'))";

/// Provides CRUD operations for tags.
pub struct TagRepo;

impl TagRepo {
    /// List every tag ordered by name in byte order (`COLLATE "C"`).
    pub async fn list(pool: &PgPool) -> Result<Vec<Tag>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tags ORDER BY name COLLATE \"C\", id");
        sqlx::query_as::<_, Tag>(&query).fetch_all(pool).await
    }

    /// Find a tag by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tags WHERE id = $1");
        sqlx::query_as::<_, Tag>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a new tag, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateTag) -> Result<Tag, sqlx::Error> {
        let query = format!("{INSERT} RETURNING {COLUMNS}");
        bind_create(sqlx::query_as::<_, Tag>(&query), input)
            .fetch_one(pool)
            .await
    }

    /// Insert several tags in one transaction. Either all rows are created
    /// or none are.
    pub async fn create_many(pool: &PgPool, inputs: &[CreateTag]) -> Result<Vec<Tag>, sqlx::Error> {
        let query = format!("{INSERT} RETURNING {COLUMNS}");
        let mut tx = pool.begin().await?;
        let mut created = Vec::with_capacity(inputs.len());

        for input in inputs {
            let row = bind_create(sqlx::query_as::<_, Tag>(&query), input)
                .fetch_one(&mut *tx)
                .await?;
            created.push(row);
        }

        tx.commit().await?;
        Ok(created)
    }

    /// Update a tag. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no tag with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTag,
    ) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!(
            "UPDATE tags SET \
                name = COALESCE($2, name), \
                data_type = COALESCE($3, data_type), \
                comment = COALESCE($4, comment), \
                group_name = COALESCE($5, group_name), \
                address = COALESCE($6, address), \
                value = COALESCE($7, value), \
                active = COALESCE($8, active), \
                retain = COALESCE($9, retain), \
                data_source = COALESCE($10, data_source), \
                mqtt_path = COALESCE($11, mqtt_path), \
                opc_node_id = COALESCE($12, opc_node_id), \
                modbus_register = COALESCE($13, modbus_register), \
                device_id = COALESCE($14, device_id), \
                multiplier = COALESCE($15, multiplier), \
                update_interval = COALESCE($16, update_interval), \
                direct_logging = COALESCE($17, direct_logging), \
                log_duration = COALESCE($18, log_duration), \
                alarm_enabled = COALESCE($19, alarm_enabled), \
                alarm_high_limit = COALESCE($20, alarm_high_limit), \
                alarm_low_limit = COALESCE($21, alarm_low_limit), \
                connection_status = COALESCE($22, connection_status) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.data_type)
            .bind(&input.comment)
            .bind(&input.group_name)
            .bind(&input.address)
            .bind(&input.value)
            .bind(input.active)
            .bind(input.retain)
            .bind(&input.data_source)
            .bind(&input.mqtt_path)
            .bind(&input.opc_node_id)
            .bind(&input.modbus_register)
            .bind(&input.device_id)
            .bind(input.multiplier)
            .bind(&input.update_interval)
            .bind(input.direct_logging)
            .bind(&input.log_duration)
            .bind(input.alarm_enabled)
            .bind(input.alarm_high_limit)
            .bind(input.alarm_low_limit)
            .bind(&input.connection_status)
            .fetch_optional(pool)
            .await
    }

    /// Delete a tag by ID. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete several tags atomically.
    ///
    /// Duplicate ids are collapsed. If any id does not exist the transaction
    /// is rolled back, nothing is deleted and `false` is returned.
    pub async fn delete_many(pool: &PgPool, ids: &[DbId]) -> Result<bool, sqlx::Error> {
        let unique: Vec<DbId> = ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        if unique.is_empty() {
            return Ok(true);
        }

        let mut tx = pool.begin().await?;
        let result = sqlx::query("DELETE FROM tags WHERE id = ANY($1)")
            .bind(&unique)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() < unique.len() as u64 {
            tx.rollback().await?;
            tracing::debug!(
                requested = unique.len(),
                found = result.rows_affected(),
                "Bulk tag delete rolled back"
            );
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Rewrite `group_name` from `old_name` to `new_name` on every matching
    /// tag. This is the explicit re-sync after a group rename; renames never
    /// cascade on their own. Returns the number of tags touched.
    pub async fn reassign_group<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        old_name: &str,
        new_name: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE tags SET group_name = $2 WHERE group_name = $1")
            .bind(old_name)
            .bind(new_name)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}

fn bind_create<'q>(
    query: sqlx::query::QueryAs<'q, sqlx::Postgres, Tag, sqlx::postgres::PgArguments>,
    input: &'q CreateTag,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, Tag, sqlx::postgres::PgArguments> {
    query
        .bind(&input.name)
        .bind(&input.data_type)
        .bind(&input.comment)
        .bind(&input.group_name)
        .bind(&input.address)
        .bind(&input.value)
        .bind(input.active)
        .bind(input.retain)
        .bind(&input.data_source)
        .bind(&input.mqtt_path)
        .bind(&input.opc_node_id)
        .bind(&input.modbus_register)
        .bind(&input.device_id)
        .bind(input.multiplier)
        .bind(&input.update_interval)
        .bind(input.direct_logging)
        .bind(&input.log_duration)
        .bind(input.alarm_enabled)
        .bind(input.alarm_high_limit)
        .bind(input.alarm_low_limit)
        .bind(&input.connection_status)
}
