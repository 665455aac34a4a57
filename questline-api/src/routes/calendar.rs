//! Calendar endpoint: a date-range view over tasks and habit completions.
//!
//! # Endpoints
//!
//! - `GET /v1/calendar?from=...&to=...` - Everything scheduled or completed
//!   in the range

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use questline_shared::{
    auth::middleware::AuthContext,
    models::{
        habit::HabitCompletion,
        task::Task,
    },
};
use serde::{Deserialize, Serialize};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Calendar range. Both bounds are required, RFC 3339, inclusive.
#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Calendar response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarResponse {
    /// Tasks due or scheduled in the range
    pub tasks: Vec<Task>,

    /// Habit completions recorded in the range
    pub habit_completions: Vec<HabitCompletion>,
}

/// The authenticated user's tasks and habit completions within a range.
///
/// Tasks match if either their due date or their scheduled time falls in
/// the range; completions match on when they were recorded.
pub async fn get_calendar(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<CalendarQuery>,
) -> ApiResult<Json<CalendarResponse>> {
    if query.from > query.to {
        return Err(ApiError::BadRequest(
            "Range start must not be after range end".to_string(),
        ));
    }

    let (tasks, habit_completions) = tokio::try_join!(
        Task::list_in_range_for_user(state.store.pool(), auth.user_id, query.from, query.to),
        HabitCompletion::list_in_range_for_user(
            state.store.pool(),
            auth.user_id,
            query.from,
            query.to
        ),
    )?;

    Ok(Json(CalendarResponse {
        tasks,
        habit_completions,
    }))
}
