pub mod error;
pub mod middleware;
pub mod pages;
pub mod protocol;
pub mod routes;
pub mod save;
pub mod state;
pub mod token;

// Re-export the router and shared state so the binary can assemble the server.
pub use middleware::{resolve_identity, RequestIdentity};
pub use routes::{openapi_document, router, ApiDoc};
pub use state::AppState;
