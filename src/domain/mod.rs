pub mod error;
pub mod model;

pub use error::{CatalogError, CatalogResult, ErrorKind};
