use crate::error::{ApiError, Result};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

/// The hot path: resolves a code and answers with a 302 to the
/// destination. Resolution records a click as a side effect.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    let Ok(code) = snaplink_core::ShortCode::new(&code) else {
        return Err(ApiError::NotFound);
    };

    let long_url = state
        .shortener()
        .resolve(&code)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok((StatusCode::FOUND, [(header::LOCATION, long_url)]).into_response())
}
