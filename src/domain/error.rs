//! Error taxonomy shared by the catalog service and the HTTP layer.
//!
//! The `Display` text of every client-facing variant is the message sent back
//! to API callers under the `erro` key.

use thiserror::Error;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

pub const AUTHOR_NAME_REQUIRED: &str = "Nome do autor é obrigatório.";
pub const BOOK_FIELDS_REQUIRED: &str =
    "Campos obrigatórios (titulo, isbn, autor_id) estão faltando.";
pub const INVALID_BODY: &str = "Corpo da requisição inválido.";

/// Catalog errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A required field is missing or blank, or the body is malformed.
    #[error("{0}")]
    Validation(String),

    #[error("Autor não encontrado.")]
    AuthorNotFound(i64),

    #[error("Livro não encontrado.")]
    BookNotFound(i64),

    /// `autor_id` on a new book does not reference an existing author.
    #[error("Autor ID não encontrado.")]
    UnknownAuthor(i64),

    /// `autor_id` supplied on a book update does not reference an existing author.
    #[error("Novo Autor ID não encontrado.")]
    UnknownNewAuthor(i64),

    #[error("ISBN já cadastrado.")]
    DuplicateIsbn(String),

    /// Anything the database reports that is not one of the cases above.
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Coarse classification used by the transport layer to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Reference,
    Conflict,
    Internal,
}

impl CatalogError {
    pub fn validation(message: impl Into<String>) -> Self {
        CatalogError::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Validation(_) => ErrorKind::Validation,
            CatalogError::AuthorNotFound(_) | CatalogError::BookNotFound(_) => ErrorKind::NotFound,
            CatalogError::UnknownAuthor(_) | CatalogError::UnknownNewAuthor(_) => {
                ErrorKind::Reference
            }
            CatalogError::DuplicateIsbn(_) => ErrorKind::Conflict,
            CatalogError::Storage(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            CatalogError::validation(AUTHOR_NAME_REQUIRED).kind(),
            ErrorKind::Validation
        );
        assert_eq!(CatalogError::BookNotFound(3).kind(), ErrorKind::NotFound);
        assert_eq!(CatalogError::UnknownNewAuthor(9).kind(), ErrorKind::Reference);
        assert_eq!(
            CatalogError::DuplicateIsbn("123".to_string()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            CatalogError::Storage(sqlx::Error::RowNotFound).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_client_messages() {
        assert_eq!(
            CatalogError::DuplicateIsbn("123".to_string()).to_string(),
            "ISBN já cadastrado."
        );
        assert_eq!(
            CatalogError::UnknownAuthor(1).to_string(),
            "Autor ID não encontrado."
        );
        assert_eq!(
            CatalogError::validation(BOOK_FIELDS_REQUIRED).to_string(),
            BOOK_FIELDS_REQUIRED
        );
    }
}
