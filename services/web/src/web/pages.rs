//! services/web/src/web/pages.rs
//!
//! Handlers for the index page and the liveness probe.

use axum::{
    extract::State,
    response::{Html, IntoResponse},
    Extension,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use visit_core::domain::{Document, Identity, PageView};

use crate::web::{error::HttpError, middleware::RequestIdentity, state::AppState};

/// GET /status - Liveness probe
#[utoipa::path(
    get,
    path = "/status",
    responses(
        (status = 200, description = "Service is up", body = String)
    )
)]
pub async fn status_handler() -> &'static str {
    "OK"
}

/// GET / and /index.html - Render the visitor or document page.
///
/// Anonymous visitors get the example page without touching storage. For a
/// known user the latest saved document is loaded; any trouble loading it
/// just means starting from an empty document.
pub async fn page_handler(
    State(state): State<Arc<AppState>>,
    Extension(request_identity): Extension<RequestIdentity>,
) -> Result<impl IntoResponse, HttpError> {
    let (identity, authenticated) = match request_identity.get() {
        Some(identity) => (identity.clone(), true),
        None => (Identity::visitor(), false),
    };
    info!("New visit from: {} {}", identity.id, identity.name);

    let mut document = Document::default();
    if authenticated {
        if let Some(store) = &state.store {
            match store.load_latest(identity.id).await {
                Ok(Some(latest)) => document = latest,
                Ok(None) => {}
                Err(e) => warn!("Unable to load latest document for {}: {}", identity.id, e),
            }
        }
    }

    // The file on disk is not trusted to say who owns it.
    document.stamp_owner(&identity);

    let view = PageView {
        document,
        authenticated,
    };
    let html = state.renderer.render(&view).await.map_err(|e| {
        error!("Unable to execute template: {}", e);
        HttpError::Internal
    })?;

    Ok(Html(html))
}
