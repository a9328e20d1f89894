use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use snaplink_core::ShortenerError;
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Unknown, deleted or expired code; all three look alike by design.
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Shortener(#[from] ShortenerError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => error_response(StatusCode::NOT_FOUND, "not found"),
            ApiError::Shortener(err) => match &err {
                ShortenerError::InvalidUrl(_)
                | ShortenerError::InvalidShortCode(_)
                | ShortenerError::InvalidExpiration(_) => {
                    error_response(StatusCode::BAD_REQUEST, err.to_string())
                }
                ShortenerError::DuplicateCode(_) => {
                    error_response(StatusCode::CONFLICT, err.to_string())
                }
                ShortenerError::CollisionExhausted { .. } => {
                    error_response(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
                }
                ShortenerError::Storage(_) | ShortenerError::Cache(_) => {
                    error!(error = %err, "backend failure while handling request");
                    error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
                }
            },
        }
    }
}
