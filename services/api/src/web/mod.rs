pub mod middleware;
pub mod rest;
pub mod state;

pub use middleware::require_user;
pub use rest::ApiDoc;
pub use state::{AppState, LocalProfiles};

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Builds the complete application router: identity-protected API routes plus Swagger UI.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    // Every API route needs a resolved user identity.
    let api_router = Router::new()
        .route("/locators/parse", post(rest::parse_locator_handler))
        .route(
            "/locators/{canonical_id}/reachable",
            get(rest::reachability_handler),
        )
        .route("/catalog/entries", post(rest::create_catalog_entry_handler))
        .route(
            "/progress/{document_id}",
            get(rest::get_progress_handler).put(rest::update_progress_handler),
        )
        .route(
            "/annotations/{document_id}",
            get(rest::list_annotations_handler).post(rest::add_annotation_handler),
        )
        .route("/favorites", get(rest::list_favorites_handler))
        .route(
            "/favorites/{document_id}",
            put(rest::add_favorite_handler).delete(rest::remove_favorite_handler),
        )
        .route_layer(axum_middleware::from_fn(require_user))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
