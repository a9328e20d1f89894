use crate::error::{ApiError, Result};
use crate::model::{CreateLinkRequest, CreateLinkResponse, LinkSummary, ListQuery, PreviewResponse};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use snaplink_core::ShortCode;

const DEFAULT_LIST_LIMIT: usize = 10;
const MAX_LIST_LIMIT: usize = 100;

/// Codes that cannot even be well-formed are reported as not found, the
/// same as unknown ones.
fn parse_code(raw: &str) -> Result<ShortCode> {
    ShortCode::new(raw).map_err(|_| ApiError::NotFound)
}

pub async fn create_link_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<CreateLinkResponse>)> {
    let params = request.into_params()?;
    let long_url = params.long_url.clone();

    let code = state.shortener().shorten(params).await?;

    let response = CreateLinkResponse {
        short_url: code.to_url(state.base_url()),
        short_code: code.to_string(),
        long_url,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn preview_link_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PreviewResponse>> {
    let code = parse_code(&code)?;

    let preview = state
        .shortener()
        .preview(&code)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(PreviewResponse {
        long_url: preview.long_url,
        clicks: preview.clicks,
    }))
}

pub async fn delete_link_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    let code = parse_code(&code)?;

    if state.shortener().delete(&code).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

pub async fn list_links_handler(
    Query(query): Query<ListQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<LinkSummary>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);

    let links = state.shortener().recent(limit).await?;
    Ok(Json(links.into_iter().map(LinkSummary::from).collect()))
}
