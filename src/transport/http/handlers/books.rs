use crate::domain::error::CatalogError;
use crate::domain::model::{Book, BookChanges, NewBook};
use crate::transport::http::handlers::common::{json_body, path_id};
use crate::transport::http::types::{
    AppState, CreateBookRequest, ErrorBody, MessageBody, UpdateBookRequest,
};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

#[utoipa::path(
    get,
    path = "/api/livros",
    responses(
        (status = 200, description = "All books with their author's name", body = [Book]),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn list_books_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Book>>, CatalogError> {
    Ok(Json(state.catalog.list_books().await?))
}

#[utoipa::path(
    post,
    path = "/api/livros",
    request_body = CreateBookRequest,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Missing titulo, isbn or autor_id", body = ErrorBody),
        (status = 404, description = "autor_id does not exist", body = ErrorBody),
        (status = 409, description = "ISBN already registered", body = ErrorBody)
    )
)]
pub async fn create_book_handler(
    State(state): State<AppState>,
    request: Result<Json<CreateBookRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), CatalogError> {
    let input = NewBook::try_from(json_body(request)?)?;
    let book = state.catalog.create_book(input).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

#[utoipa::path(
    get,
    path = "/api/livros/{id}",
    params(("id" = i64, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book", body = Book),
        (status = 404, description = "Book not found", body = ErrorBody)
    )
)]
pub async fn get_book_handler(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Book>, CatalogError> {
    let id = path_id(id, CatalogError::BookNotFound)?;
    Ok(Json(state.catalog.get_book(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/livros/{id}",
    params(("id" = i64, Path, description = "Book id")),
    request_body = UpdateBookRequest,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Blank required field or invalid body", body = ErrorBody),
        (status = 404, description = "Book or new autor_id not found", body = ErrorBody),
        (status = 409, description = "ISBN belongs to another book", body = ErrorBody)
    )
)]
pub async fn update_book_handler(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    request: Result<Json<UpdateBookRequest>, JsonRejection>,
) -> Result<Json<Book>, CatalogError> {
    let id = path_id(id, CatalogError::BookNotFound)?;
    let body = match json_body(request) {
        Ok(body) => body,
        Err(e) => {
            // An unknown id wins over a bad body.
            state.catalog.get_book(id).await?;
            return Err(e);
        }
    };
    Ok(Json(state.catalog.update_book(id, BookChanges::from(body)).await?))
}

#[utoipa::path(
    delete,
    path = "/api/livros/{id}",
    params(("id" = i64, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book deleted", body = MessageBody),
        (status = 404, description = "Book not found", body = ErrorBody)
    )
)]
pub async fn delete_book_handler(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageBody>, CatalogError> {
    let id = path_id(id, CatalogError::BookNotFound)?;
    let book = state.catalog.delete_book(id).await?;
    Ok(Json(MessageBody {
        mensagem: format!("Livro {} deletado com sucesso!", book.title),
    }))
}
