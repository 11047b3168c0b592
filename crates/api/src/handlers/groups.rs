//! Handlers for tag groups.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tagdeck_core::error::CoreError;
use tagdeck_core::group::validate_group_name;
use tagdeck_core::types::DbId;
use tagdeck_db::models::group::{CreateGroup, UpdateGroup};
use tagdeck_db::repositories::GroupRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct GroupUpdateParams {
    /// Re-point tags that reference the old name when the group is renamed.
    #[serde(default)]
    pub sync_tags: bool,
}

fn not_found(id: DbId) -> CoreError {
    CoreError::NotFound { entity: "Group", id }
}

/// GET /api/v1/groups
pub async fn list_groups(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let groups = GroupRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: groups }))
}

/// POST /api/v1/groups
pub async fn create_group(
    State(state): State<AppState>,
    Json(mut input): Json<CreateGroup>,
) -> AppResult<impl IntoResponse> {
    validate_group_name(&input.name)?;
    input.name = input.name.trim().to_string();

    let group = GroupRepo::create(&state.pool, &input).await?;

    tracing::info!(group_id = group.id, name = %group.name, "Group created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: group })))
}

/// PUT /api/v1/groups/{id}
///
/// A rename leaves tags on the old name unless `sync_tags=true` is passed.
pub async fn update_group(
    State(state): State<AppState>,
    Path(group_id): Path<DbId>,
    Query(params): Query<GroupUpdateParams>,
    Json(mut input): Json<UpdateGroup>,
) -> AppResult<impl IntoResponse> {
    if let Some(name) = input.name.as_mut() {
        validate_group_name(name)?;
        *name = name.trim().to_string();
    }

    let group = if params.sync_tags {
        let (group, moved) = GroupRepo::update_syncing_tags(&state.pool, group_id, &input)
            .await?
            .ok_or_else(|| not_found(group_id))?;
        if moved > 0 {
            tracing::info!(group_id, to = %group.name, tags = moved, "Group tags re-pointed");
        }
        group
    } else {
        GroupRepo::update(&state.pool, group_id, &input)
            .await?
            .ok_or_else(|| not_found(group_id))?
    };

    tracing::info!(group_id, "Group updated");

    Ok(Json(DataResponse { data: group }))
}

/// DELETE /api/v1/groups/{id}
pub async fn delete_group(
    State(state): State<AppState>,
    Path(group_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !GroupRepo::delete(&state.pool, group_id).await? {
        return Err(not_found(group_id).into());
    }

    tracing::info!(group_id, "Group deleted");

    Ok(StatusCode::NO_CONTENT)
}
