//! Habit model and database operations.
//!
//! Recurring practices a user tracks. Every completion inserts a
//! [`HabitCompletion`] evidence row; the ledger pairs that insert with the
//! owner's balance credit inside one unit of work. A habit can be completed
//! any number of times per day, each time awarding independently.
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE habit_frequency AS ENUM ('daily', 'weekly', 'monthly');
//!
//! CREATE TABLE habits (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     title VARCHAR(100) NOT NULL,
//!     description VARCHAR(500),
//!     frequency habit_frequency NOT NULL DEFAULT 'daily',
//!     target_count INTEGER NOT NULL DEFAULT 1 CHECK (target_count BETWEEN 1 AND 100),
//!     color VARCHAR(7),
//!     icon VARCHAR(30),
//!     is_active BOOLEAN NOT NULL DEFAULT TRUE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//!
//! CREATE TABLE habit_completions (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     habit_id UUID NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
//!     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     note VARCHAR(500),
//!     completed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// How often the habit is meant to recur. Informational; completions are
/// never rejected for being off-schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "habit_frequency", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum HabitFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl HabitFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            HabitFrequency::Daily => "daily",
            HabitFrequency::Weekly => "weekly",
            HabitFrequency::Monthly => "monthly",
        }
    }
}

impl Default for HabitFrequency {
    fn default() -> Self {
        HabitFrequency::Daily
    }
}

/// A recurring habit owned by a user.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: Uuid,

    pub user_id: Uuid,

    pub title: String,

    pub description: Option<String>,

    pub frequency: HabitFrequency,

    /// Times per frequency period the user aims for
    pub target_count: i32,

    /// Display color as `#RRGGBB`
    pub color: Option<String>,

    pub icon: Option<String>,

    /// Inactive habits are kept for history but can't be completed
    pub is_active: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// One completion of a habit. This row is the award's evidence: it is
/// inserted in the same unit of work as the balance credit.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HabitCompletion {
    pub id: Uuid,
    pub habit_id: Uuid,
    pub user_id: Uuid,
    pub note: Option<String>,
    pub completed_at: DateTime<Utc>,
}

/// Input for creating a habit.
#[derive(Debug, Clone)]
pub struct CreateHabit {
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub frequency: HabitFrequency,
    pub target_count: i32,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// Partial update; only non-None fields are written.
#[derive(Debug, Clone, Default)]
pub struct UpdateHabitFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub frequency: Option<HabitFrequency>,
    pub target_count: Option<i32>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_active: Option<bool>,
}

const HABIT_COLUMNS: &str = "id, user_id, title, description, frequency, target_count, \
                             color, icon, is_active, created_at, updated_at";

impl Habit {
    /// Creates a new active habit.
    pub async fn create(pool: &PgPool, data: CreateHabit) -> Result<Self, sqlx::Error> {
        let habit = sqlx::query_as::<_, Habit>(&format!(
            r#"
            INSERT INTO habits (user_id, title, description, frequency, target_count, color, icon)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {HABIT_COLUMNS}
            "#,
        ))
        .bind(data.user_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.frequency)
        .bind(data.target_count)
        .bind(data.color)
        .bind(data.icon)
        .fetch_one(pool)
        .await?;

        Ok(habit)
    }

    /// Finds a habit by ID scoped to its owner, active or not.
    pub async fn find_by_id_and_owner(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let habit = sqlx::query_as::<_, Habit>(&format!(
            "SELECT {HABIT_COLUMNS} FROM habits WHERE id = $1 AND user_id = $2",
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(habit)
    }

    /// Finds a habit only if it is owned by `user_id` AND active.
    ///
    /// The ledger's precondition for awarding a completion: an inactive or
    /// foreign habit comes back `None` and never awards.
    pub async fn find_active_by_id_and_owner(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let habit = sqlx::query_as::<_, Habit>(&format!(
            "SELECT {HABIT_COLUMNS} FROM habits WHERE id = $1 AND user_id = $2 AND is_active = TRUE",
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

        Ok(habit)
    }

    /// Lists a user's habits, active ones first, then newest first.
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let habits = sqlx::query_as::<_, Habit>(&format!(
            r#"
            SELECT {HABIT_COLUMNS}
            FROM habits
            WHERE user_id = $1
            ORDER BY is_active DESC, created_at DESC
            "#,
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(habits)
    }

    /// Applies a partial update. Only non-None fields are written; the
    /// `updated_at` timestamp is always refreshed.
    pub async fn update_fields(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        data: UpdateHabitFields,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE habits SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${bind_count}"));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${bind_count}"));
        }
        if data.frequency.is_some() {
            bind_count += 1;
            query.push_str(&format!(", frequency = ${bind_count}"));
        }
        if data.target_count.is_some() {
            bind_count += 1;
            query.push_str(&format!(", target_count = ${bind_count}"));
        }
        if data.color.is_some() {
            bind_count += 1;
            query.push_str(&format!(", color = ${bind_count}"));
        }
        if data.icon.is_some() {
            bind_count += 1;
            query.push_str(&format!(", icon = ${bind_count}"));
        }
        if data.is_active.is_some() {
            bind_count += 1;
            query.push_str(&format!(", is_active = ${bind_count}"));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND user_id = $2 RETURNING {HABIT_COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, Habit>(&query).bind(id).bind(user_id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(frequency) = data.frequency {
            q = q.bind(frequency);
        }
        if let Some(target_count) = data.target_count {
            q = q.bind(target_count);
        }
        if let Some(color) = data.color {
            q = q.bind(color);
        }
        if let Some(icon) = data.icon {
            q = q.bind(icon);
        }
        if let Some(is_active) = data.is_active {
            q = q.bind(is_active);
        }

        let habit = q.fetch_optional(pool).await?;

        Ok(habit)
    }

    /// Deletes a habit (and, via cascade, its completions) if the caller
    /// owns it.
    pub async fn delete_for_owner(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM habits WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts all habits in the system (admin stats).
    pub async fn count_all(executor: impl PgExecutor<'_>) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM habits")
            .fetch_one(executor)
            .await?;

        Ok(count)
    }
}

impl HabitCompletion {
    /// Inserts a completion row.
    ///
    /// Runs on any executor; the ledger calls it inside a unit of work so
    /// the row and the award land atomically.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        habit_id: Uuid,
        user_id: Uuid,
        note: Option<String>,
    ) -> Result<Self, sqlx::Error> {
        let completion = sqlx::query_as::<_, HabitCompletion>(
            r#"
            INSERT INTO habit_completions (habit_id, user_id, note)
            VALUES ($1, $2, $3)
            RETURNING id, habit_id, user_id, note, completed_at
            "#,
        )
        .bind(habit_id)
        .bind(user_id)
        .bind(note)
        .fetch_one(executor)
        .await?;

        Ok(completion)
    }

    /// The most recent completions of one habit.
    pub async fn list_recent_for_habit(
        pool: &PgPool,
        habit_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let completions = sqlx::query_as::<_, HabitCompletion>(
            r#"
            SELECT id, habit_id, user_id, note, completed_at
            FROM habit_completions
            WHERE habit_id = $1
            ORDER BY completed_at DESC
            LIMIT $2
            "#,
        )
        .bind(habit_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(completions)
    }

    /// A user's completions within `[from, to]` (calendar view).
    pub async fn list_in_range_for_user(
        pool: &PgPool,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let completions = sqlx::query_as::<_, HabitCompletion>(
            r#"
            SELECT id, habit_id, user_id, note, completed_at
            FROM habit_completions
            WHERE user_id = $1 AND completed_at BETWEEN $2 AND $3
            ORDER BY completed_at ASC
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await?;

        Ok(completions)
    }

    /// Lifetime completion count for a user (progress aggregation).
    pub async fn count_for_user(
        executor: impl PgExecutor<'_>,
        user_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM habit_completions WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(executor)
                .await?;

        Ok(count)
    }

    /// Counts all completions in the system (admin stats).
    pub async fn count_all(executor: impl PgExecutor<'_>) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM habit_completions")
            .fetch_one(executor)
            .await?;

        Ok(count)
    }
}
