pub mod app;
pub mod domain;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::CatalogService;
pub use domain::model::{Author, Book};
pub use domain::{CatalogError, CatalogResult};
pub use infra::AppConfig;
