use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use crate::error::{ApiError, Result};
use crate::guard;
use crate::models::{CardPatch, CreateCard, KanbanCard};
use crate::rate_limiter::presets;
use crate::response;
use crate::state::AppState;
use crate::validation;

#[derive(Debug, Deserialize)]
pub struct DeleteCardParams {
    #[serde(default)]
    pub id: Option<String>,
}

/// GET /api/kanban
pub async fn list_cards(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let user =
        guard::require_auth_and_rate_limit(&state, &headers, "kanban:get", &presets::READ).await?;
    let cards = state.db.list_cards(&user.id).await?;
    Ok(response::ok(cards))
}

/// POST /api/kanban
pub async fn create_card(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateCard>,
) -> Result<Response> {
    let user =
        guard::require_auth_and_rate_limit(&state, &headers, "kanban:post", &presets::WRITE)
            .await?;
    validation::validate_name("title", &req.title)?;

    let card = state.db.insert_card(KanbanCard::create(&user.id, req)).await?;
    Ok(response::created(card))
}

/// PATCH /api/kanban — the card id travels in the body.
pub async fn update_card(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(patch): Json<CardPatch>,
) -> Result<Response> {
    let user =
        guard::require_auth_and_rate_limit(&state, &headers, "kanban:patch", &presets::WRITE)
            .await?;
    if let Some(title) = &patch.title {
        validation::validate_name("title", title)?;
    }

    let mut card = owned_card(&state, &patch.id, &user.id).await?;
    card.apply(patch);
    let card = state.db.update_card(card).await?;
    Ok(response::ok(card))
}

/// DELETE /api/kanban?id=
pub async fn delete_card(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<DeleteCardParams>,
) -> Result<Response> {
    let user =
        guard::require_auth_and_rate_limit(&state, &headers, "kanban:delete", &presets::WRITE)
            .await?;
    let id = params
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::BadRequest("id query parameter is required".to_string()))?;

    owned_card(&state, &id, &user.id).await?;
    state.db.delete_card(&id).await?;
    Ok(response::ok(serde_json::json!({ "deleted": true })))
}

async fn owned_card(state: &AppState, id: &str, owner_id: &str) -> Result<KanbanCard> {
    let card = state.db.get_card(id).await?.ok_or(ApiError::NotFound)?;
    if card.owner_id != owner_id {
        return Err(ApiError::Forbidden);
    }
    Ok(card)
}
