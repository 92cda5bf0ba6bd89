//! services/web/src/web/middleware.rs
//!
//! Identity middleware wrapping every route.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, warn};
use visit_core::{domain::Identity, ports::AuthError};

use crate::web::{
    state::AppState,
    token::{extract_token, token_cookie, TokenSource},
};

/// The identity resolved for the current request, or `None` for an anonymous
/// visitor. Always present in request extensions behind `resolve_identity`.
#[derive(Debug, Clone, Default)]
pub struct RequestIdentity(pub Option<Identity>);

impl RequestIdentity {
    pub fn get(&self) -> Option<&Identity> {
        self.0.as_ref()
    }
}

/// Middleware that resolves the visitor's identity from the token cookie.
///
/// A `t` query parameter is moved into the cookie and answered with a redirect
/// to the configured endpoint. Any trouble reading the key or the token is
/// logged and the request continues anonymously; this never rejects a request.
pub async fn resolve_identity(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    // 1. Extract the token, short-circuiting on a query token
    let token = match extract_token(req.uri(), req.headers()) {
        TokenSource::Query(token) => {
            return move_token_to_cookie(&token, &state.config.endpoint_url)
        }
        TokenSource::Cookie(token) => Some(token),
        TokenSource::None => None,
    };

    // 2. Decrypt it into an identity if we can
    let identity = match token {
        Some(token) => match state.identity.resolve(&token).await {
            Ok(identity) => Some(identity),
            Err(e) => {
                log_auth_failure(&e);
                None
            }
        },
        None => None,
    };

    // 3. Insert the identity (or its absence) into request extensions
    req.extensions_mut().insert(RequestIdentity(identity));

    // 4. Continue to the handler
    next.run(req).await
}

/// Answers with a one-year `token` cookie and a temporary redirect.
fn move_token_to_cookie(token: &str, endpoint_url: &str) -> Response {
    let location = match HeaderValue::from_str(endpoint_url) {
        Ok(location) => location,
        Err(e) => {
            error!("Endpoint URL is not a valid Location header: {:?}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut response = StatusCode::TEMPORARY_REDIRECT.into_response();
    response.headers_mut().insert(header::LOCATION, location);
    match HeaderValue::from_str(&token_cookie(token, Utc::now())) {
        Ok(cookie) => {
            response.headers_mut().insert(header::SET_COOKIE, cookie);
        }
        Err(e) => warn!("Query token cannot be stored in a cookie: {:?}", e),
    }
    response
}

fn log_auth_failure(e: &AuthError) {
    // Key trouble is ours to fix; a bad token is usually the client's.
    if e.is_key_problem() || matches!(e, AuthError::ClaimParse(_)) {
        error!("{}", e);
    } else {
        warn!("{}", e);
    }
}
