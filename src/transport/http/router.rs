use crate::domain::model::{Author, Book};
use crate::transport::http::handlers::{authors, books, health};
use crate::transport::http::types::{
    CreateAuthorRequest, CreateBookRequest, ErrorBody, HealthResponse, MessageBody,
    UpdateAuthorRequest, UpdateBookRequest,
};
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        authors::list_authors_handler,
        authors::create_author_handler,
        authors::get_author_handler,
        authors::update_author_handler,
        authors::delete_author_handler,
        books::list_books_handler,
        books::create_book_handler,
        books::get_book_handler,
        books::update_book_handler,
        books::delete_book_handler
    ),
    components(schemas(
        Author,
        Book,
        CreateAuthorRequest,
        UpdateAuthorRequest,
        CreateBookRequest,
        UpdateBookRequest,
        ErrorBody,
        MessageBody,
        HealthResponse
    ))
)]
pub struct ApiDoc;

pub fn create_router(app_state: crate::transport::http::types::AppState) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route(
            "/api/autores",
            get(authors::list_authors_handler).post(authors::create_author_handler),
        )
        .route(
            "/api/autores/:id",
            get(authors::get_author_handler)
                .put(authors::update_author_handler)
                .delete(authors::delete_author_handler),
        )
        .route(
            "/api/livros",
            get(books::list_books_handler).post(books::create_book_handler),
        )
        .route(
            "/api/livros/:id",
            get(books::get_book_handler)
                .put(books::update_book_handler)
                .delete(books::delete_book_handler),
        )
        .with_state(app_state)
}
