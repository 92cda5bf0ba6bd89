pub mod fs_store;
pub mod jwe;
pub mod templates;

pub use fs_store::FsDocumentStore;
pub use jwe::JweIdentityResolver;
pub use templates::TemplateRenderer;
