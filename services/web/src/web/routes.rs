//! services/web/src/web/routes.rs
//!
//! Builds the application router and holds the master definition for the
//! OpenAPI specification.

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::web::{
    middleware::resolve_identity,
    pages::{self, page_handler, status_handler},
    protocol::DocumentBody,
    save::{self, save_handler},
    state::AppState,
};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        pages::status_handler,
        save::save_handler,
    ),
    components(
        schemas(DocumentBody)
    ),
    tags(
        (name = "visit3d", description = "Token-authenticated per-user document storage.")
    )
)]
pub struct ApiDoc;

/// The OpenAPI document, listing `server_url` as the server when given.
pub fn openapi_document(server_url: Option<&str>) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    if let Some(url) = server_url {
        doc.servers = Some(vec![utoipa::openapi::server::Server::new(url)]);
    }
    doc
}

//=========================================================================================
// Router
//=========================================================================================

/// Assembles every route behind the identity middleware. Paths without a
/// handler fall through to the static directory.
pub fn router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);

    let app_routes = Router::new()
        .route("/", get(page_handler))
        .route("/index.html", get(page_handler))
        .route("/status", get(status_handler))
        .route("/save", post(save_handler))
        .fallback_service(static_files)
        .with_state(state.clone());

    Router::new()
        .merge(app_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(axum_middleware::from_fn_with_state(state, resolve_identity))
        .layer(TraceLayer::new_for_http())
}
