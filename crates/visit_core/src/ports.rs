//! crates/visit_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete token format, storage layout and templates.

use async_trait::async_trait;
use std::path::PathBuf;
use crate::domain::{Document, Identity, PageView};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for storage and rendering port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Storage failure: {0}")]
    Storage(String),
    #[error("Malformed data: {0}")]
    Malformed(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Authentication Errors
//=========================================================================================

/// Every way resolving an identity from a token can fail.
///
/// None of these are fatal to a request: callers log them and carry on
/// serving an anonymous visitor.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Unable to read key file: {0}")]
    KeyRead(String),
    #[error("Unable to parse key file: {0}")]
    KeyParse(String),
    #[error("Invalid key: {0}")]
    KeyInvalid(String),
    #[error("Malformed token envelope: {0}")]
    TokenFormat(String),
    #[error("Unable to decrypt token: {0}")]
    Decrypt(String),
    #[error("Unable to parse token claims: {0}")]
    ClaimParse(String),
}

impl AuthError {
    /// Whether the failure lies with the server's own key material rather
    /// than with the token the client presented.
    pub fn is_key_problem(&self) -> bool {
        matches!(
            self,
            AuthError::KeyRead(_) | AuthError::KeyParse(_) | AuthError::KeyInvalid(_)
        )
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Turns a raw encrypted token into a trusted identity.
    async fn resolve(&self, token: &str) -> Result<Identity, AuthError>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Loads the most recently modified document saved for `user_id`.
    ///
    /// Returns `Ok(None)` when the user has never saved anything.
    async fn load_latest(&self, user_id: i64) -> PortResult<Option<Document>>;

    /// Persists a new version of `document` under its owner's history and
    /// returns the path that was written.
    async fn save(&self, document: &Document) -> PortResult<PathBuf>;
}

#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Renders the index page for the given view.
    async fn render(&self, view: &PageView) -> PortResult<String>;
}
