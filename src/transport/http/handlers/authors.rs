use crate::domain::error::CatalogError;
use crate::domain::model::{Author, AuthorChanges, NewAuthor};
use crate::transport::http::handlers::common::{json_body, path_id};
use crate::transport::http::types::{
    AppState, CreateAuthorRequest, ErrorBody, MessageBody, UpdateAuthorRequest,
};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

#[utoipa::path(
    get,
    path = "/api/autores",
    responses(
        (status = 200, description = "All authors", body = [Author]),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn list_authors_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Author>>, CatalogError> {
    Ok(Json(state.catalog.list_authors().await?))
}

#[utoipa::path(
    post,
    path = "/api/autores",
    request_body = CreateAuthorRequest,
    responses(
        (status = 201, description = "Author created", body = Author),
        (status = 400, description = "Missing nome or invalid body", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn create_author_handler(
    State(state): State<AppState>,
    request: Result<Json<CreateAuthorRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Author>), CatalogError> {
    let input = NewAuthor::try_from(json_body(request)?)?;
    let author = state.catalog.create_author(input).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

#[utoipa::path(
    get,
    path = "/api/autores/{id}",
    params(("id" = i64, Path, description = "Author id")),
    responses(
        (status = 200, description = "Author", body = Author),
        (status = 404, description = "Author not found", body = ErrorBody)
    )
)]
pub async fn get_author_handler(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Author>, CatalogError> {
    let id = path_id(id, CatalogError::AuthorNotFound)?;
    Ok(Json(state.catalog.get_author(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/autores/{id}",
    params(("id" = i64, Path, description = "Author id")),
    request_body = UpdateAuthorRequest,
    responses(
        (status = 200, description = "Author updated", body = Author),
        (status = 400, description = "Blank nome or invalid body", body = ErrorBody),
        (status = 404, description = "Author not found", body = ErrorBody)
    )
)]
pub async fn update_author_handler(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    request: Result<Json<UpdateAuthorRequest>, JsonRejection>,
) -> Result<Json<Author>, CatalogError> {
    let id = path_id(id, CatalogError::AuthorNotFound)?;
    let body = match json_body(request) {
        Ok(body) => body,
        Err(e) => {
            // An unknown id wins over a bad body.
            state.catalog.get_author(id).await?;
            return Err(e);
        }
    };
    Ok(Json(state.catalog.update_author(id, AuthorChanges::from(body)).await?))
}

#[utoipa::path(
    delete,
    path = "/api/autores/{id}",
    params(("id" = i64, Path, description = "Author id")),
    responses(
        (status = 200, description = "Author and their books deleted", body = MessageBody),
        (status = 404, description = "Author not found", body = ErrorBody)
    )
)]
pub async fn delete_author_handler(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageBody>, CatalogError> {
    let id = path_id(id, CatalogError::AuthorNotFound)?;
    let author = state.catalog.delete_author(id).await?;
    Ok(Json(MessageBody {
        mensagem: format!("Autor {} deletado com sucesso!", author.name),
    }))
}
