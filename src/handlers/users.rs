use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use chrono::Utc;

use crate::error::Result;
use crate::guard;
use crate::models::{UpsertUser, User};
use crate::rate_limiter::presets;
use crate::response;
use crate::state::AppState;

/// GET /api/users
pub async fn list_users(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    guard::require_auth_and_rate_limit(&state, &headers, "users:get", &presets::READ).await?;
    let users = state.db.list_users().await?;
    Ok(response::ok(users))
}

/// POST /api/users — upsert the caller's own profile record.
pub async fn upsert_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UpsertUser>,
) -> Result<Response> {
    let principal =
        guard::require_auth_and_rate_limit(&state, &headers, "users:post", &presets::WRITE)
            .await?;

    let user = state
        .db
        .upsert_user(User {
            id: principal.id,
            name: req.name.or(principal.name),
            email: req.email.or(principal.email),
            image: req.image.or(principal.image),
            created_at: Utc::now(),
        })
        .await?;
    Ok(response::ok(user))
}
