use super::{is_present, CatalogModel};
use crate::domain::error::{CatalogError, CatalogResult, AUTHOR_NAME_REQUIRED};
use serde::Serialize;
use utoipa::ToSchema;

/// An author as returned by the catalog, with its live book count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow, ToSchema)]
pub struct Author {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    /// Free-form date string, not validated.
    #[serde(rename = "nascimento")]
    pub birth_date: Option<String>,
    /// Derived from the `livro` table on every read, never stored.
    #[serde(rename = "livros_count")]
    pub books_count: i64,
}

impl CatalogModel for Author {
    fn table_name() -> &'static str {
        "autor"
    }

    fn create_table_sql() -> &'static str {
        "CREATE TABLE IF NOT EXISTS autor (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            nome VARCHAR(100) NOT NULL,
            nascimento VARCHAR(10)
        )"
    }
}

/// Input for `create_author`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuthor {
    pub name: String,
    pub birth_date: Option<String>,
}

impl NewAuthor {
    pub fn validate(&self) -> CatalogResult<()> {
        if !is_present(&self.name) {
            return Err(CatalogError::validation(AUTHOR_NAME_REQUIRED));
        }
        Ok(())
    }
}

/// Partial update for an author. `None` leaves the stored value untouched and
/// `Some(None)` is an explicit null: it clears `birth_date` and is rejected
/// for `name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorChanges {
    pub name: Option<Option<String>>,
    pub birth_date: Option<Option<String>>,
}

impl AuthorChanges {
    pub fn validate(&self) -> CatalogResult<()> {
        match &self.name {
            Some(Some(name)) if is_present(name) => Ok(()),
            Some(_) => Err(CatalogError::validation(AUTHOR_NAME_REQUIRED)),
            None => Ok(()),
        }
    }

    /// Applies the supplied fields on top of `current`. Expects `validate` to
    /// have passed.
    pub fn apply_to(self, current: &mut Author) {
        if let Some(Some(name)) = self.name {
            current.name = name;
        }
        if let Some(birth_date) = self.birth_date {
            current.birth_date = birth_date;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jane() -> Author {
        Author {
            id: 1,
            name: "Jane Austen".to_string(),
            birth_date: Some("1775-12-16".to_string()),
            books_count: 2,
        }
    }

    #[test]
    fn test_serializes_with_wire_names() {
        let json = serde_json::to_value(jane()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 1,
                "nome": "Jane Austen",
                "nascimento": "1775-12-16",
                "livros_count": 2
            })
        );
    }

    #[test]
    fn test_blank_name_rejected() {
        let input = NewAuthor {
            name: "   ".to_string(),
            birth_date: None,
        };
        assert!(matches!(input.validate(), Err(CatalogError::Validation(_))));

        let changes = AuthorChanges {
            name: Some(Some(String::new())),
            birth_date: None,
        };
        assert!(changes.validate().is_err());

        let changes = AuthorChanges {
            name: Some(None),
            birth_date: None,
        };
        assert!(changes.validate().is_err());
    }

    #[test]
    fn test_partial_changes_keep_other_fields() {
        let mut author = jane();
        AuthorChanges {
            name: Some(Some("J. Austen".to_string())),
            birth_date: None,
        }
        .apply_to(&mut author);
        assert_eq!(author.name, "J. Austen");
        assert_eq!(author.birth_date.as_deref(), Some("1775-12-16"));

        AuthorChanges {
            name: None,
            birth_date: Some(None),
        }
        .apply_to(&mut author);
        assert_eq!(author.name, "J. Austen");
        assert_eq!(author.birth_date, None);
    }
}
