pub mod sqlite;

pub use sqlite::{apply_schema, connect, open, CatalogPools};
