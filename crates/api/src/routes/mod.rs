pub mod data_sources;
pub mod groups;
pub mod health;
pub mod tags;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /tags                                  list (filter + sort), create
/// /tags/columns                          default column layout
/// /tags/export                           CSV download of the filtered list
/// /tags/import                           CSV upload (POST)
/// /tags/bulk-delete                      all-or-nothing delete (POST)
/// /tags/{id}                             get, update, delete
///
/// /groups                                list, create
/// /groups/{id}                           update (?sync_tags=), delete
///
/// /data-sources                          list, create
/// /data-sources/validate                 violations only (POST)
/// /data-sources/test                     test an unsaved candidate (POST)
/// /data-sources/{id}                     get, update, delete
/// /data-sources/{id}/test                test and record status (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/tags", tags::router())
        .nest("/groups", groups::router())
        .nest("/data-sources", data_sources::router())
}
