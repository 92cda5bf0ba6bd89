//! crates/visit_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any wire or on-disk representation.

use serde_json::{Map, Value};

/// Display name used for requests that carry no resolved identity.
pub const VISITOR_NAME: &str = "Visitor";

/// The trusted (id, name) pair recovered from a decrypted token.
///
/// Only the identity resolver constructs one of these; nothing read from a
/// client request body ever becomes an `Identity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub name: String,
}

impl Identity {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// The placeholder identity shown to anonymous visitors.
    pub fn visitor() -> Self {
        Self::new(0, VISITOR_NAME)
    }
}

/// A versioned per-user document.
///
/// `version` selects how downstream consumers interpret `payload`; the core
/// treats both as opaque and passes them through unchanged. A `None` payload
/// is a document that never carried data and is written back as `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub owner_id: i64,
    pub owner_name: String,
    pub version: u64,
    pub payload: Option<Map<String, Value>>,
}

impl Document {
    /// Overwrites the ownership fields with the server-verified identity.
    pub fn stamp_owner(&mut self, identity: &Identity) {
        self.owner_id = identity.id;
        self.owner_name = identity.name.clone();
    }

    /// Consuming variant of [`Document::stamp_owner`].
    pub fn owned_by(mut self, identity: &Identity) -> Self {
        self.stamp_owner(identity);
        self
    }
}

/// Everything the page renderer needs to produce the index page.
#[derive(Debug, Clone)]
pub struct PageView {
    pub document: Document,
    pub authenticated: bool,
}
