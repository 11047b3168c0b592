use sqlx::PgPool;
use tagdeck_core::types::DbId;

use crate::models::group::{CreateGroup, Group, UpdateGroup};
use crate::repositories::TagRepo;

const COLUMNS: &str = "id, name, expanded, parent_id, description, created_at, updated_at";

fn update_query() -> String {
    format!(
        "UPDATE groups SET \
            name = COALESCE($2, name), \
            expanded = COALESCE($3, expanded), \
            parent_id = COALESCE($4, parent_id), \
            description = COALESCE($5, description) \
         WHERE id = $1 \
         RETURNING {COLUMNS}"
    )
}

fn bind_update<'q>(
    query: sqlx::query::QueryAs<'q, sqlx::Postgres, Group, sqlx::postgres::PgArguments>,
    id: DbId,
    input: &'q UpdateGroup,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, Group, sqlx::postgres::PgArguments> {
    query
        .bind(id)
        .bind(&input.name)
        .bind(input.expanded)
        .bind(input.parent_id)
        .bind(&input.description)
}

/// Provides CRUD operations for tag groups.
pub struct GroupRepo;

impl GroupRepo {
    /// List every group ordered by name in byte order.
    pub async fn list(pool: &PgPool) -> Result<Vec<Group>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM groups ORDER BY name COLLATE \"C\", id");
        sqlx::query_as::<_, Group>(&query).fetch_all(pool).await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Group>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM groups WHERE id = $1");
        sqlx::query_as::<_, Group>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a new group. A duplicate name fails on `uq_groups_name`.
    pub async fn create(pool: &PgPool, input: &CreateGroup) -> Result<Group, sqlx::Error> {
        let query = format!(
            "INSERT INTO groups (name, expanded, parent_id, description) \
             VALUES ($1, COALESCE($2, true), $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Group>(&query)
            .bind(&input.name)
            .bind(input.expanded)
            .bind(input.parent_id)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    /// Update a group. Tags referencing the old name are left untouched; see
    /// [`GroupRepo::update_syncing_tags`].
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateGroup,
    ) -> Result<Option<Group>, sqlx::Error> {
        let query = update_query();
        bind_update(sqlx::query_as::<_, Group>(&query), id, input)
            .fetch_optional(pool)
            .await
    }

    /// Update a group and, if it was renamed, re-point its tags to the new
    /// name in the same transaction. Either both writes land or neither does.
    ///
    /// Returns the updated group and the number of tags moved, or `None` if no
    /// group with the given `id` exists.
    pub async fn update_syncing_tags(
        pool: &PgPool,
        id: DbId,
        input: &UpdateGroup,
    ) -> Result<Option<(Group, u64)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let old_name: Option<String> =
            sqlx::query_scalar("SELECT name FROM groups WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(old_name) = old_name else {
            return Ok(None);
        };

        let moved = match input.name.as_deref() {
            Some(new_name) if new_name != old_name => {
                TagRepo::reassign_group(&mut *tx, &old_name, new_name).await?
            }
            _ => 0,
        };

        let query = update_query();
        let group = bind_update(sqlx::query_as::<_, Group>(&query), id, input)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some((group, moved)))
    }

    /// Delete a group. Child groups are detached (`ON DELETE SET NULL`).
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
