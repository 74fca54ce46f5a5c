use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;

use crate::error::{ApiError, Result};
use crate::guard;
use crate::models::{CreateProject, Project, ProjectPatch};
use crate::rate_limiter::presets;
use crate::response;
use crate::state::AppState;
use crate::validation;

/// GET /api/projects
pub async fn list_projects(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let user =
        guard::require_auth_and_rate_limit(&state, &headers, "projects:get", &presets::READ)
            .await?;
    let projects = state.db.list_projects(&user.id).await?;
    Ok(response::ok(projects))
}

/// POST /api/projects
pub async fn create_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateProject>,
) -> Result<Response> {
    let user =
        guard::require_auth_and_rate_limit(&state, &headers, "projects:post", &presets::WRITE)
            .await?;
    validation::validate_name("name", &req.name)?;

    let project = state.db.insert_project(Project::create(&user.id, req)).await?;
    Ok(response::created(project))
}

/// GET /api/projects/:id
pub async fn get_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response> {
    let user =
        guard::require_auth_and_rate_limit(&state, &headers, "projects:id:get", &presets::READ)
            .await?;
    let project = owned_project(&state, &id, &user.id).await?;
    Ok(response::ok(project))
}

/// PATCH /api/projects/:id
pub async fn update_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<ProjectPatch>,
) -> Result<Response> {
    let user =
        guard::require_auth_and_rate_limit(&state, &headers, "projects:id:patch", &presets::WRITE)
            .await?;
    if let Some(name) = &patch.name {
        validation::validate_name("name", name)?;
    }

    let mut project = owned_project(&state, &id, &user.id).await?;
    project.apply(patch);
    let project = state.db.update_project(project).await?;
    Ok(response::ok(project))
}

/// DELETE /api/projects/:id
pub async fn delete_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response> {
    let user = guard::require_auth_and_rate_limit(
        &state,
        &headers,
        "projects:id:delete",
        &presets::WRITE,
    )
    .await?;

    owned_project(&state, &id, &user.id).await?;
    state.db.delete_project(&id).await?;
    Ok(response::ok(serde_json::json!({ "deleted": true })))
}

async fn owned_project(state: &AppState, id: &str, owner_id: &str) -> Result<Project> {
    let project = state.db.get_project(id).await?.ok_or(ApiError::NotFound)?;
    if project.owner_id != owner_id {
        return Err(ApiError::Forbidden);
    }
    Ok(project)
}
