use axum::routing::{get, post};
use axum::Router;

use crate::handlers::tags;
use crate::state::AppState;

/// Tag routes mounted at `/tags`.
///
/// ```text
/// GET    /                  -> list_tags
/// POST   /                  -> create_tag
/// GET    /columns           -> column_layout
/// GET    /export            -> export_tags
/// POST   /import            -> import_tags
/// POST   /bulk-delete       -> bulk_delete
/// GET    /{id}              -> get_tag
/// PUT    /{id}              -> update_tag
/// DELETE /{id}              -> delete_tag
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tags::list_tags).post(tags::create_tag))
        .route("/columns", get(tags::column_layout))
        .route("/export", get(tags::export_tags))
        .route("/import", post(tags::import_tags))
        .route("/bulk-delete", post(tags::bulk_delete))
        .route(
            "/{id}",
            get(tags::get_tag)
                .put(tags::update_tag)
                .delete(tags::delete_tag),
        )
}
