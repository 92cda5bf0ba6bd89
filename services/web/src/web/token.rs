//! services/web/src/web/token.rs
//!
//! Finds the raw encrypted token on an incoming request and builds the cookie
//! that carries it between visits.

use axum::{
    extract::Query,
    http::{header, HeaderMap, Uri},
};
use chrono::{DateTime, Duration, Months, Utc};

/// Name of the cookie holding the encrypted token.
pub const TOKEN_COOKIE: &str = "token";
/// Query parameter carrying a one-time token.
pub const TOKEN_PARAM: &str = "t";

/// Where (if anywhere) the request carries a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// One-time token in the URL; must be moved into a cookie and redirected.
    Query(String),
    /// Token presented by the persistent cookie.
    Cookie(String),
    None,
}

/// Looks for a token in the `t` query parameter first, then the `token`
/// cookie. A query token wins even when a cookie is also present.
pub fn extract_token(uri: &Uri, headers: &HeaderMap) -> TokenSource {
    if let Some(token) = query_token(uri) {
        return TokenSource::Query(token);
    }
    match cookie_token(headers) {
        Some(token) => TokenSource::Cookie(token),
        None => TokenSource::None,
    }
}

fn query_token(uri: &Uri) -> Option<String> {
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri).ok()?;
    pairs
        .into_iter()
        .find(|(name, _)| name == TOKEN_PARAM)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    let prefix = format!("{}=", TOKEN_COOKIE);
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| c.trim().strip_prefix(prefix.as_str()))
        .map(|value| value.trim_matches('"').to_string())
}

/// Builds the `Set-Cookie` value storing `token` for one year from `now`.
pub fn token_cookie(token: &str, now: DateTime<Utc>) -> String {
    let expires = now
        .checked_add_months(Months::new(12))
        .unwrap_or_else(|| now + Duration::days(365));
    format!(
        "{}={}; Path=/; Expires={}",
        TOKEN_COOKIE,
        token,
        expires.format("%a, %d %b %Y %H:%M:%S GMT")
    )
}
