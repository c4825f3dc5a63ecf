use crate::app::CatalogService;
use crate::domain::error::{CatalogError, AUTHOR_NAME_REQUIRED, BOOK_FIELDS_REQUIRED};
use crate::domain::model::{AuthorChanges, BookChanges, NewAuthor, NewBook};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
}

impl AppState {
    pub fn new(catalog: CatalogService) -> Self {
        Self { catalog }
    }
}

/// Body of every failed request.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ErrorBody {
    pub erro: String,
}

/// Body returned by the delete endpoints.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct MessageBody {
    pub mensagem: String,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct CreateAuthorRequest {
    /// Required, non-blank.
    #[serde(default)]
    pub nome: Option<String>,
    /// Free-form birth date.
    #[serde(default)]
    pub nascimento: Option<String>,
}

impl TryFrom<CreateAuthorRequest> for NewAuthor {
    type Error = CatalogError;

    fn try_from(req: CreateAuthorRequest) -> Result<Self, Self::Error> {
        let name = req
            .nome
            .ok_or_else(|| CatalogError::validation(AUTHOR_NAME_REQUIRED))?;
        Ok(NewAuthor {
            name,
            birth_date: req.nascimento,
        })
    }
}

/// Partial author update. Omitted fields keep their stored value; `nascimento: null` clears it.
#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct UpdateAuthorRequest {
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub nome: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub nascimento: Option<Option<String>>,
}

impl From<UpdateAuthorRequest> for AuthorChanges {
    fn from(req: UpdateAuthorRequest) -> Self {
        AuthorChanges {
            name: req.nome,
            birth_date: req.nascimento,
        }
    }
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct CreateBookRequest {
    #[serde(default)]
    pub titulo: Option<String>,
    /// Must be unique across all books.
    #[serde(default)]
    pub isbn: Option<String>,
    /// Must reference an existing author.
    #[serde(default)]
    pub autor_id: Option<i64>,
    #[serde(default)]
    pub ano_publicacao: Option<i32>,
}

impl TryFrom<CreateBookRequest> for NewBook {
    type Error = CatalogError;

    fn try_from(req: CreateBookRequest) -> Result<Self, Self::Error> {
        match (req.titulo, req.isbn, req.autor_id) {
            (Some(title), Some(isbn), Some(author_id)) => Ok(NewBook {
                title,
                isbn,
                author_id,
                publication_year: req.ano_publicacao,
            }),
            _ => Err(CatalogError::validation(BOOK_FIELDS_REQUIRED)),
        }
    }
}

/// Partial book update. Omitted fields keep their stored value; `ano_publicacao: null` clears it.
#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct UpdateBookRequest {
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub titulo: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i32>)]
    pub ano_publicacao: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub isbn: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i64>)]
    pub autor_id: Option<Option<i64>>,
}

impl From<UpdateBookRequest> for BookChanges {
    fn from(req: UpdateBookRequest) -> Self {
        BookChanges {
            title: req.titulo,
            publication_year: req.ano_publicacao,
            isbn: req.isbn,
            author_id: req.autor_id,
        }
    }
}
