use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use serde::Deserialize;

use crate::error::{ApiError, Result};
use crate::guard;
use crate::rate_limiter::presets;
use crate::response;
use crate::state::AppState;
use crate::validation;

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    #[serde(default)]
    pub filename: Option<String>,
}

/// POST /api/upload?filename=
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<Response> {
    let user =
        guard::require_auth_and_rate_limit(&state, &headers, "upload:post", &presets::WRITE)
            .await?;

    let filename = params
        .filename
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ApiError::BadRequest("filename query parameter is required".to_string()))?;
    validation::validate_filename(filename)?;

    if body.is_empty() {
        return Err(ApiError::BadRequest("request body is empty".to_string()));
    }

    let meta = state.blobs.put(&user.id, filename, body).await?;
    Ok(response::ok(meta))
}
