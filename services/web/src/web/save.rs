//! services/web/src/web/save.rs
//!
//! Handler persisting a new document version for the current user.

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::StatusCode,
    Extension,
};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::web::{
    error::HttpError, middleware::RequestIdentity, protocol::DocumentBody, state::AppState,
};

/// Largest accepted `/save` request body, in bytes.
pub const SAVE_BODY_LIMIT: usize = 1_048_576;

/// POST /save - Store a new version of the caller's document
#[utoipa::path(
    post,
    path = "/save",
    request_body = DocumentBody,
    responses(
        (status = 200, description = "Document stored"),
        (status = 400, description = "Body too large, malformed or with unknown fields"),
        (status = 403, description = "No valid token presented"),
        (status = 500, description = "Storage failure"),
        (status = 503, description = "Saving is not enabled on this server")
    )
)]
pub async fn save_handler(
    State(state): State<Arc<AppState>>,
    Extension(request_identity): Extension<RequestIdentity>,
    body: Body,
) -> Result<StatusCode, HttpError> {
    // 1. Saving needs a configured store
    let store = state.store.as_ref().ok_or(HttpError::ServiceUnavailable)?;

    // 2. And a verified identity
    let identity = request_identity.get().ok_or(HttpError::Forbidden)?;

    // 3. Read and decode the capped body
    let bytes = to_bytes(body, SAVE_BODY_LIMIT).await.map_err(|e| {
        warn!("Unable to read document body: {}", e);
        HttpError::BadRequest
    })?;
    let doc_body = DocumentBody::from_slice(&bytes).map_err(|e| {
        warn!("Unable to parse document body: {}", e);
        HttpError::BadRequest
    })?;

    // 4. Whatever the client claimed, the token decides the owner
    let document = doc_body.into_domain().owned_by(identity);

    // 5. Write it out
    let path = store.save(&document).await.map_err(|e| {
        error!("Unable to save document for {}: {}", identity.id, e);
        HttpError::Internal
    })?;
    info!("Saved document for {} to {}", identity.id, path.display());

    Ok(StatusCode::OK)
}
