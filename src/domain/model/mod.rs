//! Domain model definitions for the catalog records.

pub mod author;
pub mod book;

pub use author::{Author, AuthorChanges, NewAuthor};
pub use book::{Book, BookChanges, NewBook};

/// Contract for a record type backed by one catalog table.
///
/// Each implementation provides:
/// - the table name used in queries
/// - the SQL CREATE TABLE statement executed when provisioning the store
pub trait CatalogModel {
    /// Returns the name of the database table for this model.
    fn table_name() -> &'static str;

    /// Returns the SQL CREATE TABLE statement for this model.
    fn create_table_sql() -> &'static str;

    /// Extra statements (indexes) run after the table exists.
    fn post_create_sql() -> &'static [&'static str] {
        &[]
    }
}

/// Returns true when a required text field carries something other than whitespace.
pub(crate) fn is_present(value: &str) -> bool {
    !value.trim().is_empty()
}
