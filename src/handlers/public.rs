use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;

use crate::error::{ApiError, Result};
use crate::guard;
use crate::models::PublicProject;
use crate::rate_limiter::presets;
use crate::response;
use crate::state::AppState;

/// GET /api/public/:id — no session required, but still throttled per
/// client.
pub async fn get_public_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response> {
    guard::require_rate_limit(&state, &headers, "public:get", &presets::READ)?;

    let project = state.db.get_project(&id).await?.ok_or(ApiError::NotFound)?;
    if !project.published {
        return Err(ApiError::Forbidden);
    }
    Ok(response::ok(PublicProject::from(&project)))
}
