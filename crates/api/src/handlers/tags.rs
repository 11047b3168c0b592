//! Handlers for tags: CRUD, the filtered/sorted table view, CSV export and
//! import, and bulk delete.

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tagdeck_core::error::CoreError;
use tagdeck_core::import::{import_csv, ImportLineError};
use tagdeck_core::status::ConnectionStatus;
use tagdeck_core::tag::{validate_tag, DataType, TagCandidate, TagSource, FILTER_ALL};
use tagdeck_core::types::DbId;
use tagdeck_core::view::{
    export_csv, project, ColumnLayout, Selection, SortConfig, SortDirection, SortKey, TagFilter,
    EXPORT_FILENAME, EXPORT_MIME,
};
use tagdeck_db::models::tag::{CreateTag, Tag, UpdateTag};
use tagdeck_db::repositories::TagRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters shared by the list and export endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct TagListParams {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub data_type: Option<String>,
    pub group: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
}

impl TagListParams {
    fn filter(&self) -> TagFilter {
        let mut filter = TagFilter::default();
        if let Some(search) = &self.search {
            filter.search = search.clone();
        }
        if let Some(data_type) = self.data_type.as_deref().filter(|t| *t != FILTER_ALL) {
            // Legacy spellings (Int16, Int32) filter on the canonical label.
            filter.data_type = data_type
                .parse::<DataType>()
                .map(|t| t.as_str().to_string())
                .unwrap_or_else(|_| data_type.to_string());
        }
        if let Some(group) = &self.group {
            filter.group = group.clone();
        }
        filter
    }

    fn sort(&self) -> AppResult<SortConfig> {
        let Some(key) = self.sort.as_deref().filter(|k| !k.is_empty()) else {
            return Ok(SortConfig::default());
        };
        let key = SortKey::from_str(key).map_err(AppError::BadRequest)?;
        let direction = match self.dir.as_deref() {
            None | Some("") => SortDirection::Asc,
            Some(dir) => SortDirection::from_str(dir).map_err(AppError::BadRequest)?,
        };
        Ok(SortConfig::by(key, direction))
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<DbId>,
}

#[derive(Debug, Serialize)]
pub struct BulkDeleteResponse {
    pub deleted: usize,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub created: Vec<Tag>,
    pub rejected: Vec<ImportLineError>,
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn status_violation(status: Option<&str>) -> Option<String> {
    let status = status?;
    status.parse::<ConnectionStatus>().err().map(|_| {
        let labels: Vec<&str> = ConnectionStatus::ALL.iter().map(|s| s.as_str()).collect();
        format!(
            "Connection status must be one of {}, got \"{status}\"",
            labels.join(", ")
        )
    })
}

fn check(candidate: TagCandidate<'_>, connection_status: Option<&str>) -> AppResult<()> {
    let mut violations = validate_tag(&candidate);
    violations.extend(status_violation(connection_status));
    if violations.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(violations))
    }
}

/// Rewrite an accepted alias to its canonical label.
fn canonicalize<T: FromStr>(value: &mut String, label: fn(&T) -> &'static str) {
    if let Ok(parsed) = value.parse::<T>() {
        *value = label(&parsed).to_string();
    }
}

fn canonicalize_opt<T: FromStr>(value: &mut Option<String>, label: fn(&T) -> &'static str) {
    if let Some(value) = value.as_mut() {
        canonicalize(value, label);
    }
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Tag", id })
}

// ---------------------------------------------------------------------------
// Table view
// ---------------------------------------------------------------------------

/// GET /api/v1/tags
///
/// All tags, filtered by `search`/`type`/`group` and sorted by `sort`/`dir`.
/// Without `sort` the store order (name, byte order) is kept.
pub async fn list_tags(
    State(state): State<AppState>,
    Query(params): Query<TagListParams>,
) -> AppResult<impl IntoResponse> {
    let filter = params.filter();
    let sort = params.sort()?;

    let tags = TagRepo::list(&state.pool).await?;

    Ok(Json(DataResponse {
        data: visible_tags(&tags, &filter, &sort),
    }))
}

/// Owned copies of the rows `project` keeps, in its order.
fn visible_tags(tags: &[Tag], filter: &TagFilter, sort: &SortConfig) -> Vec<Tag> {
    project(tags, filter, sort).into_iter().cloned().collect()
}

/// GET /api/v1/tags/columns
pub async fn column_layout() -> impl IntoResponse {
    Json(DataResponse {
        data: ColumnLayout::default(),
    })
}

/// GET /api/v1/tags/export
///
/// The same projection as the list endpoint, rendered as CSV.
pub async fn export_tags(
    State(state): State<AppState>,
    Query(params): Query<TagListParams>,
) -> AppResult<impl IntoResponse> {
    let filter = params.filter();
    let sort = params.sort()?;

    let tags = TagRepo::list(&state.pool).await?;
    let visible = project(&tags, &filter, &sort);
    let csv = export_csv(&visible);

    tracing::info!(rows = visible.len(), "Tags exported");

    Ok((
        [
            (CONTENT_TYPE, EXPORT_MIME.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILENAME}\""),
            ),
        ],
        csv,
    ))
}

/// POST /api/v1/tags/import
///
/// Body is CSV text in the export format. Valid rows are inserted in one
/// transaction; rejected rows are reported with their line numbers.
pub async fn import_tags(State(state): State<AppState>, body: String) -> AppResult<impl IntoResponse> {
    let report = import_csv(&body)?;

    let inputs: Vec<CreateTag> = report.drafts.into_iter().map(CreateTag::from).collect();
    let created = if inputs.is_empty() {
        Vec::new()
    } else {
        TagRepo::create_many(&state.pool, &inputs).await?
    };

    tracing::info!(
        created = created.len(),
        rejected = report.errors.len(),
        "Tags imported"
    );

    Ok(Json(DataResponse {
        data: ImportResponse {
            created,
            rejected: report.errors,
        },
    }))
}

/// POST /api/v1/tags/bulk-delete
///
/// Deletes every listed tag or none of them.
pub async fn bulk_delete(
    State(state): State<AppState>,
    Json(input): Json<BulkDeleteRequest>,
) -> AppResult<impl IntoResponse> {
    let selection: Selection = input.ids.into_iter().collect();
    if selection.is_empty() {
        return Err(AppError::BadRequest("ids must not be empty".into()));
    }

    let ids = selection.ids();
    if !TagRepo::delete_many(&state.pool, &ids).await? {
        return Err(AppError::NotFound(
            "One or more tags not found; nothing was deleted".into(),
        ));
    }

    tracing::info!(count = ids.len(), "Tags bulk deleted");

    Ok(Json(DataResponse {
        data: BulkDeleteResponse { deleted: ids.len() },
    }))
}

// ---------------------------------------------------------------------------
// Tag CRUD
// ---------------------------------------------------------------------------

/// POST /api/v1/tags
pub async fn create_tag(
    State(state): State<AppState>,
    Json(mut input): Json<CreateTag>,
) -> AppResult<impl IntoResponse> {
    check(
        TagCandidate {
            name: Some(&input.name),
            data_type: Some(&input.data_type),
            data_source: input.data_source.as_deref(),
            update_interval: input.update_interval.as_deref(),
            multiplier: input.multiplier,
            alarm_low_limit: input.alarm_low_limit,
            alarm_high_limit: input.alarm_high_limit,
        },
        input.connection_status.as_deref(),
    )?;

    input.name = input.name.trim().to_string();
    canonicalize(&mut input.data_type, DataType::as_str);
    canonicalize_opt(&mut input.data_source, TagSource::as_str);
    canonicalize_opt(&mut input.connection_status, ConnectionStatus::as_str);

    let tag = TagRepo::create(&state.pool, &input).await?;

    tracing::info!(tag_id = tag.id, name = %tag.name, "Tag created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: tag })))
}

/// GET /api/v1/tags/{id}
pub async fn get_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let tag = TagRepo::find_by_id(&state.pool, tag_id)
        .await?
        .ok_or_else(|| not_found(tag_id))?;

    Ok(Json(DataResponse { data: tag }))
}

/// PUT /api/v1/tags/{id}
///
/// Partial update: only the fields present are validated and written.
pub async fn update_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<DbId>,
    Json(mut input): Json<UpdateTag>,
) -> AppResult<impl IntoResponse> {
    check(
        TagCandidate {
            name: input.name.as_deref(),
            data_type: input.data_type.as_deref(),
            data_source: input.data_source.as_deref(),
            update_interval: input.update_interval.as_deref(),
            multiplier: input.multiplier,
            alarm_low_limit: input.alarm_low_limit,
            alarm_high_limit: input.alarm_high_limit,
        },
        input.connection_status.as_deref(),
    )?;

    if let Some(name) = input.name.as_mut() {
        *name = name.trim().to_string();
    }
    canonicalize_opt(&mut input.data_type, DataType::as_str);
    canonicalize_opt(&mut input.data_source, TagSource::as_str);
    canonicalize_opt(&mut input.connection_status, ConnectionStatus::as_str);

    let tag = TagRepo::update(&state.pool, tag_id, &input)
        .await?
        .ok_or_else(|| not_found(tag_id))?;

    tracing::info!(tag_id, "Tag updated");

    Ok(Json(DataResponse { data: tag }))
}

/// DELETE /api/v1/tags/{id}
pub async fn delete_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !TagRepo::delete(&state.pool, tag_id).await? {
        return Err(not_found(tag_id));
    }

    tracing::info!(tag_id, "Tag deleted");

    Ok(StatusCode::NO_CONTENT)
}
