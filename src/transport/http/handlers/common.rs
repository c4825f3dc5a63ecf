use crate::domain::error::{CatalogError, ErrorKind, INVALID_BODY};
use crate::transport::http::types::ErrorBody;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

pub const INTERNAL_ERROR_MESSAGE: &str = "Erro interno do servidor.";

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound | ErrorKind::Reference => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let erro = match kind {
            // Storage details stay in the log.
            ErrorKind::Internal => {
                tracing::error!(error = %self, "request failed on storage");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
            _ => self.to_string(),
        };
        (status_for(kind), Json(ErrorBody { erro })).into_response()
    }
}

/// Unwraps a JSON body, turning any rejection (bad syntax, wrong field types,
/// missing content type) into a 400. The rejection detail only goes to the log.
pub fn json_body<T>(request: Result<Json<T>, JsonRejection>) -> Result<T, CatalogError> {
    match request {
        Ok(Json(body)) => Ok(body),
        Err(e) => {
            tracing::debug!(error = %e.body_text(), "rejected request body");
            Err(CatalogError::validation(INVALID_BODY))
        }
    }
}

/// Unwraps an integer id from the path. Anything that is not an integer names no
/// record, so it is reported through `not_found` with id 0 (never assigned).
pub fn path_id(
    path: Result<Path<i64>, PathRejection>,
    not_found: fn(i64) -> CatalogError,
) -> Result<i64, CatalogError> {
    path.map(|Path(id)| id).map_err(|_| not_found(0))
}
