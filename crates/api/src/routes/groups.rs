use axum::routing::{get, put};
use axum::Router;

use crate::handlers::groups;
use crate::state::AppState;

/// Group routes mounted at `/groups`.
///
/// ```text
/// GET    /                  -> list_groups
/// POST   /                  -> create_group
/// PUT    /{id}              -> update_group (?sync_tags=true re-points tags)
/// DELETE /{id}              -> delete_group
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(groups::list_groups).post(groups::create_group))
        .route("/{id}", put(groups::update_group).delete(groups::delete_group))
}
