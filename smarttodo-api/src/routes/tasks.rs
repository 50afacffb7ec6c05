/// Task endpoints
///
/// All handlers run behind the bearer token middleware and act only on the
/// caller's own tasks. A task owned by someone else answers exactly like a
/// missing one: `404 {"detail": "Task not found"}`.
///
/// # Endpoints
///
/// - `POST /tasks/` - Create task
/// - `GET /tasks/?skip=0&limit=100` - List tasks
/// - `GET /tasks/stats/` - Statistics summary
/// - `GET /tasks/:task_id` - Get task
/// - `PUT /tasks/:task_id` - Replace task
/// - `DELETE /tasks/:task_id` - Delete task

use crate::{
    app::{AppState, AuthContext},
    error::{ApiError, ApiResult},
    routes::health::MessageResponse,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use smarttodo_shared::models::task::{Task, TaskFields, DEFAULT_PRIORITY};
use smarttodo_shared::stats::{summarize_for_owner, TaskStats};
use validator::{Validate, ValidationError};

/// Body of `POST /tasks/` and `PUT /tasks/:task_id`
///
/// Omitted fields take their defaults, on update too: a `PUT` replaces the
/// whole task, including the tag set.
#[derive(Debug, Deserialize, Validate)]
pub struct TaskPayload {
    #[validate(length(max = 100, message = "Title must be at most 100 characters"))]
    pub title: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub is_completed: bool,

    #[serde(default = "default_priority")]
    pub priority: i32,

    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,

    #[validate(custom(function = "validate_tag_names"))]
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

fn validate_tag_names(tags: &Vec<String>) -> Result<(), ValidationError> {
    if tags.iter().any(|tag| tag.is_empty() || tag.chars().count() > 50) {
        let mut err = ValidationError::new("tag_length");
        err.message = Some("Tag names must be 1-50 characters".into());
        return Err(err);
    }
    Ok(())
}

impl From<TaskPayload> for TaskFields {
    fn from(payload: TaskPayload) -> Self {
        TaskFields {
            title: payload.title,
            description: payload.description,
            is_completed: payload.is_completed,
            priority: payload.priority,
            due_date: payload.due_date,
            tags: payload.tags,
        }
    }
}

/// Pagination parameters
#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub skip: u32,

    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    100
}

fn task_not_found() -> ApiError {
    ApiError::NotFound("Task not found".to_string())
}

/// Create a task owned by the caller
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<TaskPayload>, JsonRejection>,
) -> ApiResult<Json<Task>> {
    let Json(payload) = payload?;
    payload.validate()?;

    let task = state.store.create_task(auth.user_id, payload.into()).await?;
    tracing::debug!(task_id = task.id, user_id = auth.user_id, "Task created");

    Ok(Json(task))
}

/// List a page of the caller's tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Task>>> {
    let Query(params) = params?;

    let tasks = state
        .store
        .list_tasks(auth.user_id, params.skip, params.limit)
        .await?;

    Ok(Json(tasks))
}

/// Get one of the caller's tasks
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    task_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Task>> {
    let Path(task_id) = task_id?;

    state
        .store
        .get_task(task_id, auth.user_id)
        .await?
        .map(Json)
        .ok_or_else(task_not_found)
}

/// Replace one of the caller's tasks
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    task_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<TaskPayload>, JsonRejection>,
) -> ApiResult<Json<Task>> {
    let Path(task_id) = task_id?;
    let Json(payload) = payload?;
    payload.validate()?;

    state
        .store
        .update_task(task_id, auth.user_id, payload.into())
        .await?
        .map(Json)
        .ok_or_else(task_not_found)
}

/// Delete one of the caller's tasks
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    task_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Path(task_id) = task_id?;

    if !state.store.delete_task(task_id, auth.user_id).await? {
        return Err(task_not_found());
    }

    tracing::debug!(task_id, user_id = auth.user_id, "Task deleted");
    Ok(Json(MessageResponse {
        message: "Task deleted successfully".to_string(),
    }))
}

/// Statistics over all of the caller's tasks
pub async fn task_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<TaskStats>> {
    let stats = summarize_for_owner(state.store.as_ref(), auth.user_id).await?;
    Ok(Json(stats))
}
