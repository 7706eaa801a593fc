pub mod health;
pub mod sessions;

use axum::{
    response::Html,
    routing::{delete, get, post},
    Router,
};

use crate::classify::handlers as classify;
use crate::labeling::handlers as labeling;
use crate::state::AppState;

/// GET /
/// Single-page form over the JSON API.
async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health::health_handler))
        .route("/api/v1/sessions", post(sessions::handle_create_session))
        .route("/api/v1/sessions/:id", get(sessions::handle_get_session))
        .route(
            "/api/v1/sessions/:id/classify",
            post(classify::handle_classify),
        )
        .route(
            "/api/v1/sessions/:id/suggestions",
            post(labeling::handle_suggest),
        )
        .route(
            "/api/v1/sessions/:id/mappings",
            get(labeling::handle_list_mappings).post(labeling::handle_add_mapping),
        )
        .route(
            "/api/v1/sessions/:id/mappings/export",
            get(labeling::handle_export_mappings),
        )
        .route(
            "/api/v1/sessions/:id/mappings/:index",
            delete(labeling::handle_delete_mapping),
        )
        .with_state(state)
}
