use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use crate::error::{ApiError, Result};
use crate::guard;
use crate::models::{CreateTask, Task, TaskPatch};
use crate::rate_limiter::presets;
use crate::response;
use crate::state::AppState;
use crate::validation;

#[derive(Debug, Deserialize)]
pub struct ListTasksParams {
    #[serde(default)]
    pub project_id: Option<String>,
}

/// GET /api/tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListTasksParams>,
) -> Result<Response> {
    let user =
        guard::require_auth_and_rate_limit(&state, &headers, "tasks:get", &presets::READ).await?;
    let tasks = state
        .db
        .list_tasks(&user.id, params.project_id.as_deref())
        .await?;
    Ok(response::ok(tasks))
}

/// POST /api/tasks
pub async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateTask>,
) -> Result<Response> {
    let user =
        guard::require_auth_and_rate_limit(&state, &headers, "tasks:post", &presets::WRITE)
            .await?;
    validation::validate_name("title", &req.title)?;

    let task = state.db.insert_task(Task::create(&user.id, req)).await?;
    Ok(response::created(task))
}

/// PATCH /api/tasks/:id
pub async fn update_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> Result<Response> {
    let user =
        guard::require_auth_and_rate_limit(&state, &headers, "tasks:id:patch", &presets::WRITE)
            .await?;
    if let Some(title) = &patch.title {
        validation::validate_name("title", title)?;
    }

    let mut task = owned_task(&state, &id, &user.id).await?;
    task.apply(patch);
    let task = state.db.update_task(task).await?;
    Ok(response::ok(task))
}

/// DELETE /api/tasks/:id
pub async fn delete_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response> {
    let user =
        guard::require_auth_and_rate_limit(&state, &headers, "tasks:id:delete", &presets::WRITE)
            .await?;

    owned_task(&state, &id, &user.id).await?;
    state.db.delete_task(&id).await?;
    Ok(response::ok(serde_json::json!({ "deleted": true })))
}

async fn owned_task(state: &AppState, id: &str, owner_id: &str) -> Result<Task> {
    let task = state.db.get_task(id).await?.ok_or(ApiError::NotFound)?;
    if task.owner_id != owner_id {
        return Err(ApiError::Forbidden);
    }
    Ok(task)
}
