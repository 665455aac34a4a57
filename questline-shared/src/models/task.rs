//! Task model and database operations.
//!
//! One-off to-dos with a status, a priority, and optional scheduling
//! timestamps. Completing a task is the award-bearing event: the transition
//! into `completed` stamps `completed_at` and is guarded in SQL
//! ([`Task::complete_with_fields`]) so concurrent updates can never both
//! claim the same transition.
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE task_status AS ENUM ('pending', 'in_progress', 'completed', 'cancelled');
//! CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
//!
//! CREATE TABLE tasks (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     title VARCHAR(200) NOT NULL,
//!     description VARCHAR(1000),
//!     status task_status NOT NULL DEFAULT 'pending',
//!     priority task_priority NOT NULL DEFAULT 'medium',
//!     due_date TIMESTAMPTZ,
//!     scheduled_at TIMESTAMPTZ,
//!     completed_at TIMESTAMPTZ,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Task lifecycle status.
///
/// Any status may be set directly by the owner; only the transition into
/// `Completed` carries side effects (timestamp + award).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    /// Storage label for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

/// Task priority, purely informational ordering for clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

/// A one-off task owned by a user.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,

    pub user_id: Uuid,

    pub title: String,

    pub description: Option<String>,

    pub status: TaskStatus,

    pub priority: TaskPriority,

    /// When the task is due (optional)
    pub due_date: Option<DateTime<Utc>>,

    /// When the user plans to work on it (optional)
    pub scheduled_at: Option<DateTime<Utc>>,

    /// Set when the task first transitions into `completed`; survives a
    /// later move out of `completed`
    pub completed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task. Status always starts at `pending`.
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Partial update; only non-None fields are written.
#[derive(Debug, Clone, Default)]
pub struct UpdateTaskFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

const TASK_COLUMNS: &str = "id, user_id, title, description, status, priority, \
                            due_date, scheduled_at, completed_at, created_at, updated_at";

impl Task {
    /// Creates a new task in pending status.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (user_id, title, description, priority, due_date, scheduled_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(data.user_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.priority)
        .bind(data.due_date)
        .bind(data.scheduled_at)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID scoped to its owner.
    ///
    /// This is the only lookup the API uses: a foreign task is
    /// indistinguishable from a missing one.
    pub async fn find_by_id_and_owner(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2",
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

        Ok(task)
    }

    /// Lists a user's tasks, optionally filtered by status, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        status: Option<TaskStatus>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = match status {
            Some(status) => {
                sqlx::query_as::<_, Task>(&format!(
                    r#"
                    SELECT {TASK_COLUMNS}
                    FROM tasks
                    WHERE user_id = $1 AND status = $2
                    ORDER BY created_at DESC
                    "#,
                ))
                .bind(user_id)
                .bind(status)
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Task>(&format!(
                    r#"
                    SELECT {TASK_COLUMNS}
                    FROM tasks
                    WHERE user_id = $1
                    ORDER BY created_at DESC
                    "#,
                ))
                .bind(user_id)
                .fetch_all(pool)
                .await?
            }
        };

        Ok(tasks)
    }

    /// Lists a user's tasks whose due date or scheduled time falls within
    /// `[from, to]` (calendar view).
    pub async fn list_in_range_for_user(
        pool: &PgPool,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE user_id = $1
              AND (due_date BETWEEN $2 AND $3 OR scheduled_at BETWEEN $2 AND $3)
            ORDER BY COALESCE(due_date, scheduled_at) ASC
            "#,
        ))
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Applies a partial update without completion side effects.
    ///
    /// A status change applied here never touches `completed_at`: moving
    /// out of `completed` keeps the stamp, and re-asserting `completed` on
    /// an already-completed task is a plain write. The award-bearing
    /// transition goes through [`Task::complete_with_fields`] instead.
    pub async fn update_fields(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        data: UpdateTaskFields,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${bind_count}"));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${bind_count}"));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${bind_count}"));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${bind_count}"));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${bind_count}"));
        }
        if data.scheduled_at.is_some() {
            bind_count += 1;
            query.push_str(&format!(", scheduled_at = ${bind_count}"));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND user_id = $2 RETURNING {TASK_COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id).bind(user_id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(scheduled_at) = data.scheduled_at {
            q = q.bind(scheduled_at);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Completes a task and applies the remaining field changes in one
    /// statement, guarded on not already being completed.
    ///
    /// The `status <> 'completed'` condition decides the award race: of two
    /// concurrent completion attempts exactly one gets a row back. Runs on
    /// any executor so the caller can pair it with the balance credit in a
    /// unit of work.
    ///
    /// # Returns
    ///
    /// The updated task, or `None` if the task is missing, foreign, or was
    /// already completed.
    pub async fn complete_with_fields(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        user_id: Uuid,
        data: &UpdateTaskFields,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from(
            "UPDATE tasks SET status = 'completed', completed_at = NOW(), updated_at = NOW()",
        );
        let mut bind_count = 2;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${bind_count}"));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${bind_count}"));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${bind_count}"));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${bind_count}"));
        }
        if data.scheduled_at.is_some() {
            bind_count += 1;
            query.push_str(&format!(", scheduled_at = ${bind_count}"));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND user_id = $2 AND status <> 'completed' RETURNING {TASK_COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id).bind(user_id);

        if let Some(ref title) = data.title {
            q = q.bind(title.clone());
        }
        if let Some(ref description) = data.description {
            q = q.bind(description.clone());
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(scheduled_at) = data.scheduled_at {
            q = q.bind(scheduled_at);
        }

        let task = q.fetch_optional(executor).await?;

        Ok(task)
    }

    /// Deletes a task if the caller owns it.
    pub async fn delete_for_owner(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts a user's tasks currently in completed status.
    pub async fn count_completed_for_user(
        executor: impl PgExecutor<'_>,
        user_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM tasks WHERE user_id = $1 AND status = 'completed'",
        )
        .bind(user_id)
        .fetch_one(executor)
        .await?;

        Ok(count)
    }

    /// Counts all tasks in the system (admin stats).
    pub async fn count_all(executor: impl PgExecutor<'_>) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks")
            .fetch_one(executor)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(TaskStatus::Pending.as_str(), "pending");
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
        assert_eq!(TaskStatus::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        let status: TaskStatus = serde_json::from_str("\"COMPLETED\"").unwrap();
        assert_eq!(status, TaskStatus::Completed);
    }

    #[test]
    fn test_status_defaults_to_pending() {
        assert_eq!(TaskStatus::default(), TaskStatus::Pending);
        assert!(!TaskStatus::default().is_completed());
        assert!(TaskStatus::Completed.is_completed());
    }

    #[test]
    fn test_priority_wire_format() {
        assert_eq!(
            serde_json::to_string(&TaskPriority::High).unwrap(),
            "\"HIGH\""
        );
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
        assert_eq!(TaskPriority::Low.as_str(), "low");
    }

    #[test]
    fn test_update_fields_default_is_empty() {
        let update = UpdateTaskFields::default();
        assert!(update.title.is_none());
        assert!(update.status.is_none());
        assert!(update.priority.is_none());
    }
}
