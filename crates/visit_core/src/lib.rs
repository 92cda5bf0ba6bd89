pub mod domain;
pub mod ports;

pub use domain::{Document, Identity, PageView, VISITOR_NAME};
pub use ports::{AuthError, DocumentStore, IdentityResolver, PageRenderer, PortError, PortResult};
