//! Handlers for data sources. All work goes through the
//! [`DataSourceManager`](crate::services::DataSourceManager).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tagdeck_core::data_source::DataSourceCandidate;
use tagdeck_core::types::DbId;
use tagdeck_db::models::data_source::{CreateDataSource, UpdateDataSource};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /data-sources/validate`. Absent fields count as empty, so
/// the response lists every missing field at once.
#[derive(Debug, Default, Deserialize)]
pub struct ValidateRequest {
    pub name: Option<String>,
    #[serde(alias = "type")]
    pub source_type: Option<String>,
    pub endpoint: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub violations: Vec<String>,
}

/// GET /api/v1/data-sources
pub async fn list_data_sources(State(state): State<AppState>) -> impl IntoResponse {
    let data_sources = state.data_sources.list().await;
    Json(DataResponse { data: data_sources })
}

/// POST /api/v1/data-sources
pub async fn create_data_source(
    State(state): State<AppState>,
    Json(input): Json<CreateDataSource>,
) -> AppResult<impl IntoResponse> {
    let created = state.data_sources.create(&input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// POST /api/v1/data-sources/validate
///
/// Reports violations without touching the store or the network. Always 200.
pub async fn validate_data_source(
    State(state): State<AppState>,
    Json(input): Json<ValidateRequest>,
) -> impl IntoResponse {
    let violations = state.data_sources.validate(&DataSourceCandidate::complete(
        input.name.as_deref().unwrap_or_default(),
        input.source_type.as_deref().unwrap_or_default(),
        input.endpoint.as_deref().unwrap_or_default(),
    ));

    Json(DataResponse {
        data: ValidateResponse {
            valid: violations.is_empty(),
            violations,
        },
    })
}

/// POST /api/v1/data-sources/test
pub async fn test_candidate(
    State(state): State<AppState>,
    Json(input): Json<CreateDataSource>,
) -> AppResult<impl IntoResponse> {
    let result = state.data_sources.test_candidate(&input).await?;
    Ok(Json(DataResponse { data: result }))
}

/// GET /api/v1/data-sources/{id}
pub async fn get_data_source(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let ds = state.data_sources.get(id).await?;
    Ok(Json(DataResponse { data: ds }))
}

/// PUT /api/v1/data-sources/{id}
pub async fn update_data_source(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateDataSource>,
) -> AppResult<impl IntoResponse> {
    let updated = state.data_sources.update(id, &input).await?;
    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/data-sources/{id}
pub async fn delete_data_source(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state.data_sources.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/data-sources/{id}/test
///
/// A failed connection is a 200 with `success: false`; the status change is
/// recorded on the data source either way.
pub async fn test_connection(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let result = state.data_sources.test_connection(id).await?;
    Ok(Json(DataResponse { data: result }))
}
