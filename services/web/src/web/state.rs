//! services/web/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use visit_core::ports::{DocumentStore, IdentityResolver, PageRenderer};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// Nothing in here is mutated after startup; every request works on its own data.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub identity: Arc<dyn IdentityResolver>,
    /// `None` when no save directory is configured, which disables `/save`.
    pub store: Option<Arc<dyn DocumentStore>>,
    pub renderer: Arc<dyn PageRenderer>,
}
