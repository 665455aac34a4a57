//! Task endpoints.
//!
//! # Endpoints
//!
//! - `GET /v1/tasks` - List own tasks, optionally filtered by status
//! - `POST /v1/tasks` - Create task
//! - `GET /v1/tasks/:task_id` - Single task
//! - `PUT /v1/tasks/:task_id` - Update task (completion awards route through the ledger)
//! - `DELETE /v1/tasks/:task_id` - Delete task

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use questline_shared::{
    auth::middleware::AuthContext,
    models::task::{CreateTask, Task, TaskPriority, TaskStatus, UpdateTaskFields},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Create task request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    /// LOW, MEDIUM, or HIGH; defaults to MEDIUM
    #[serde(default = "default_priority")]
    pub priority: TaskPriority,

    pub due_date: Option<DateTime<Utc>>,

    pub scheduled_at: Option<DateTime<Utc>>,
}

fn default_priority() -> TaskPriority {
    TaskPriority::Medium
}

/// Update task request. All fields optional; absent fields are untouched.
/// Setting `status` to COMPLETED triggers the completion award.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    pub due_date: Option<DateTime<Utc>>,

    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Task list filter
#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    /// Restrict the listing to one status
    pub status: Option<TaskStatus>,
}

/// Lists the authenticated user's tasks, optionally filtered by status.
pub async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = Task::list_for_user(state.store.pool(), auth.user_id, query.status).await?;

    Ok(Json(tasks))
}

/// Creates a task owned by the authenticated user.
pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate()?;

    let task = Task::create(
        state.store.pool(),
        CreateTask {
            user_id: auth.user_id,
            title: req.title,
            description: req.description,
            priority: req.priority,
            due_date: req.due_date,
            scheduled_at: req.scheduled_at,
        },
    )
    .await?;

    tracing::info!(task_id = %task.id, user_id = %auth.user_id, "Task created");

    Ok((StatusCode::CREATED, Json(task)))
}

/// A single task. Ownership is part of the lookup.
pub async fn get_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = Task::find_by_id_and_owner(state.store.pool(), task_id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// Updates a task. Routed through the ledger so that a transition into
/// COMPLETED credits the award exactly once, regardless of how many times
/// or how concurrently the completion is requested.
pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;

    let task = state
        .ledger
        .update_task(
            task_id,
            auth.user_id,
            UpdateTaskFields {
                title: req.title,
                description: req.description,
                status: req.status,
                priority: req.priority,
                due_date: req.due_date,
                scheduled_at: req.scheduled_at,
            },
        )
        .await?;

    Ok(Json(task))
}

/// Deletes a task.
pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(task_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let deleted = Task::delete_for_owner(state.store.pool(), task_id, auth.user_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    tracing::info!(task_id = %task_id, user_id = %auth.user_id, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}
