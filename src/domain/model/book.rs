use super::{is_present, CatalogModel};
use crate::domain::error::{CatalogError, CatalogResult, BOOK_FIELDS_REQUIRED};
use serde::Serialize;
use utoipa::ToSchema;

/// A book as returned by the catalog, carrying its author's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "ano_publicacao")]
    pub publication_year: Option<i32>,
    pub isbn: String,
    #[serde(rename = "autor_id")]
    pub author_id: i64,
    /// Joined from `autor.nome`.
    #[serde(rename = "nome_autor")]
    pub author_name: String,
}

impl CatalogModel for Book {
    fn table_name() -> &'static str {
        "livro"
    }

    fn create_table_sql() -> &'static str {
        "CREATE TABLE IF NOT EXISTS livro (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            titulo VARCHAR(200) NOT NULL,
            ano_publicacao INTEGER,
            isbn VARCHAR(20) NOT NULL UNIQUE,
            autor_id INTEGER NOT NULL REFERENCES autor(id) ON DELETE CASCADE
        )"
    }

    fn post_create_sql() -> &'static [&'static str] {
        &["CREATE INDEX IF NOT EXISTS idx_livro_autor_id ON livro (autor_id)"]
    }
}

/// Input for `create_book`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub isbn: String,
    pub author_id: i64,
    pub publication_year: Option<i32>,
}

impl NewBook {
    pub fn validate(&self) -> CatalogResult<()> {
        if !is_present(&self.title) || !is_present(&self.isbn) {
            return Err(CatalogError::validation(BOOK_FIELDS_REQUIRED));
        }
        Ok(())
    }
}

/// Partial update for a book. `None` leaves the stored value untouched and
/// `Some(None)` is an explicit null: it clears `publication_year` and is
/// rejected for the required fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookChanges {
    pub title: Option<Option<String>>,
    pub publication_year: Option<Option<i32>>,
    pub isbn: Option<Option<String>>,
    pub author_id: Option<Option<i64>>,
}

impl BookChanges {
    pub fn validate(&self) -> CatalogResult<()> {
        let missing_text = |v: &Option<Option<String>>| match v {
            Some(Some(s)) => !is_present(s),
            Some(None) => true,
            None => false,
        };
        if missing_text(&self.title)
            || missing_text(&self.isbn)
            || matches!(self.author_id, Some(None))
        {
            return Err(CatalogError::validation(BOOK_FIELDS_REQUIRED));
        }
        Ok(())
    }

    /// The new author reference, if one was supplied.
    pub fn new_author_id(&self) -> Option<i64> {
        self.author_id.flatten()
    }

    /// The new ISBN, if one was supplied.
    pub fn new_isbn(&self) -> Option<&str> {
        self.isbn.as_ref().and_then(|v| v.as_deref())
    }

    /// Applies the supplied fields on top of `current`. Expects `validate` to
    /// have passed. `author_name` is left as is; the caller re-reads it after
    /// the write.
    pub fn apply_to(self, current: &mut Book) {
        if let Some(Some(title)) = self.title {
            current.title = title;
        }
        if let Some(year) = self.publication_year {
            current.publication_year = year;
        }
        if let Some(Some(isbn)) = self.isbn {
            current.isbn = isbn;
        }
        if let Some(Some(author_id)) = self.author_id {
            current.author_id = author_id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emma() -> Book {
        Book {
            id: 1,
            title: "Emma".to_string(),
            publication_year: Some(1815),
            isbn: "123".to_string(),
            author_id: 1,
            author_name: "Jane Austen".to_string(),
        }
    }

    #[test]
    fn test_serializes_with_wire_names() {
        let json = serde_json::to_value(emma()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 1,
                "titulo": "Emma",
                "ano_publicacao": 1815,
                "isbn": "123",
                "autor_id": 1,
                "nome_autor": "Jane Austen"
            })
        );
    }

    #[test]
    fn test_new_book_requires_title_and_isbn() {
        let mut input = NewBook {
            title: "Emma".to_string(),
            isbn: "".to_string(),
            author_id: 1,
            publication_year: None,
        };
        assert!(input.validate().is_err());
        input.isbn = "123".to_string();
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_changes_apply_only_supplied_fields() {
        let mut book = emma();
        let changes = BookChanges {
            publication_year: Some(None),
            author_id: Some(Some(2)),
            ..Default::default()
        };
        assert!(changes.validate().is_ok());
        changes.apply_to(&mut book);
        assert_eq!(book.title, "Emma");
        assert_eq!(book.isbn, "123");
        assert_eq!(book.publication_year, None);
        assert_eq!(book.author_id, 2);
    }

    #[test]
    fn test_blank_or_null_required_change_rejected() {
        let changes = BookChanges {
            title: Some(Some(" ".to_string())),
            ..Default::default()
        };
        assert!(matches!(changes.validate(), Err(CatalogError::Validation(_))));

        let changes = BookChanges {
            isbn: Some(None),
            ..Default::default()
        };
        assert!(changes.validate().is_err());

        let changes = BookChanges {
            author_id: Some(None),
            ..Default::default()
        };
        assert!(changes.validate().is_err());
    }
}
