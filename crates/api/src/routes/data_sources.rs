use axum::routing::{get, post};
use axum::Router;

use crate::handlers::data_sources;
use crate::state::AppState;

/// Data-source routes mounted at `/data-sources`.
///
/// ```text
/// GET    /                  -> list_data_sources
/// POST   /                  -> create_data_source
/// POST   /validate          -> validate_data_source
/// POST   /test              -> test_candidate
/// GET    /{id}              -> get_data_source
/// PUT    /{id}              -> update_data_source
/// DELETE /{id}              -> delete_data_source
/// POST   /{id}/test         -> test_connection
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(data_sources::list_data_sources).post(data_sources::create_data_source),
        )
        .route("/validate", post(data_sources::validate_data_source))
        .route("/test", post(data_sources::test_candidate))
        .route(
            "/{id}",
            get(data_sources::get_data_source)
                .put(data_sources::update_data_source)
                .delete(data_sources::delete_data_source),
        )
        .route("/{id}/test", post(data_sources::test_connection))
}
