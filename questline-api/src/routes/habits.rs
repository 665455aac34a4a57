//! Habit endpoints.
//!
//! # Endpoints
//!
//! - `GET /v1/habits` - List own habits
//! - `POST /v1/habits` - Create habit
//! - `GET /v1/habits/:habit_id` - Habit with recent completions
//! - `PUT /v1/habits/:habit_id` - Update habit
//! - `DELETE /v1/habits/:habit_id` - Delete habit
//! - `POST /v1/habits/:habit_id/complete` - Record a completion and award

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use questline_shared::{
    auth::middleware::AuthContext,
    models::habit::{CreateHabit, Habit, HabitCompletion, HabitFrequency, UpdateHabitFields},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

const RECENT_COMPLETIONS: i64 = 10;

/// Create habit request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateHabitRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    /// DAILY, WEEKLY, or MONTHLY
    pub frequency: HabitFrequency,

    /// Completions aimed for per frequency window
    #[validate(range(min = 1, max = 100, message = "Target count must be 1-100"))]
    #[serde(default = "default_target_count")]
    pub target_count: i32,

    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,

    #[validate(length(max = 30, message = "Icon must be at most 30 characters"))]
    pub icon: Option<String>,
}

fn default_target_count() -> i32 {
    1
}

/// Colors are stored as `#RRGGBB`.
fn validate_hex_color(color: &str) -> Result<(), ValidationError> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("hex_color")
            .with_message("Color must be in #RRGGBB format".into()))
    }
}

/// Update habit request. All fields optional; absent fields are untouched.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHabitRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    pub frequency: Option<HabitFrequency>,

    #[validate(range(min = 1, max = 100, message = "Target count must be 1-100"))]
    pub target_count: Option<i32>,

    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,

    #[validate(length(max = 30, message = "Icon must be at most 30 characters"))]
    pub icon: Option<String>,

    pub is_active: Option<bool>,
}

/// Record-a-completion request; the note is optional.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CompleteHabitRequest {
    #[validate(length(max = 500, message = "Note must be at most 500 characters"))]
    pub note: Option<String>,
}

/// Habit detail: the habit plus its most recent completions.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitDetail {
    #[serde(flatten)]
    pub habit: Habit,
    pub recent_completions: Vec<HabitCompletion>,
}

/// Lists the authenticated user's habits, newest first.
pub async fn list_habits(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<Habit>>> {
    let habits = Habit::list_for_user(state.store.pool(), auth.user_id).await?;

    Ok(Json(habits))
}

/// Creates a habit owned by the authenticated user.
pub async fn create_habit(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateHabitRequest>,
) -> ApiResult<(StatusCode, Json<Habit>)> {
    req.validate()?;

    let habit = Habit::create(
        state.store.pool(),
        CreateHabit {
            user_id: auth.user_id,
            title: req.title,
            description: req.description,
            frequency: req.frequency,
            target_count: req.target_count,
            color: req.color,
            icon: req.icon,
        },
    )
    .await?;

    tracing::info!(habit_id = %habit.id, user_id = %auth.user_id, "Habit created");

    Ok((StatusCode::CREATED, Json(habit)))
}

/// A single habit with its most recent completions.
///
/// Ownership is part of the lookup, so another user's habit id reads as
/// not found rather than forbidden.
pub async fn get_habit(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(habit_id): Path<Uuid>,
) -> ApiResult<Json<HabitDetail>> {
    let habit = Habit::find_by_id_and_owner(state.store.pool(), habit_id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Habit not found".to_string()))?;

    let recent_completions =
        HabitCompletion::list_recent_for_habit(state.store.pool(), habit.id, RECENT_COMPLETIONS)
            .await?;

    Ok(Json(HabitDetail {
        habit,
        recent_completions,
    }))
}

/// Updates a habit's fields.
pub async fn update_habit(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(habit_id): Path<Uuid>,
    Json(req): Json<UpdateHabitRequest>,
) -> ApiResult<Json<Habit>> {
    req.validate()?;

    let habit = Habit::update_fields(
        state.store.pool(),
        habit_id,
        auth.user_id,
        UpdateHabitFields {
            title: req.title,
            description: req.description,
            frequency: req.frequency,
            target_count: req.target_count,
            color: req.color,
            icon: req.icon,
            is_active: req.is_active,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Habit not found".to_string()))?;

    Ok(Json(habit))
}

/// Deletes a habit and its completion history.
pub async fn delete_habit(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(habit_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let deleted = Habit::delete_for_owner(state.store.pool(), habit_id, auth.user_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Habit not found".to_string()));
    }

    tracing::info!(habit_id = %habit_id, user_id = %auth.user_id, "Habit deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Records a completion and credits the habit award in one unit of work.
///
/// The body is optional; an empty body records a completion with no note.
pub async fn complete_habit(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(habit_id): Path<Uuid>,
    body: Option<Json<CompleteHabitRequest>>,
) -> ApiResult<(StatusCode, Json<HabitCompletion>)> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    req.validate()?;

    let completion = state
        .ledger
        .complete_habit(habit_id, auth.user_id, req.note)
        .await?;

    Ok((StatusCode::CREATED, Json(completion)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_habit_request_validation() {
        let req = CreateHabitRequest {
            title: "Morning run".to_string(),
            description: None,
            frequency: HabitFrequency::Daily,
            target_count: 1,
            color: None,
            icon: None,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_habit_rejects_empty_title() {
        let req = CreateHabitRequest {
            title: String::new(),
            description: None,
            frequency: HabitFrequency::Daily,
            target_count: 1,
            color: None,
            icon: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_habit_rejects_zero_target() {
        let req = CreateHabitRequest {
            title: "Read".to_string(),
            description: None,
            frequency: HabitFrequency::Weekly,
            target_count: 0,
            color: None,
            icon: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_habit_target_defaults_to_one() {
        let req: CreateHabitRequest =
            serde_json::from_str(r#"{"title": "Read", "frequency": "DAILY"}"#).unwrap();
        assert_eq!(req.target_count, 1);
    }

    #[test]
    fn test_hex_color_validation() {
        assert!(validate_hex_color("#1A2b3C").is_ok());
        assert!(validate_hex_color("1A2b3C").is_err());
        assert!(validate_hex_color("#1A2b3").is_err());
        assert!(validate_hex_color("#1A2b3G").is_err());
    }

    #[test]
    fn test_complete_habit_note_length() {
        let req = CompleteHabitRequest {
            note: Some("n".repeat(501)),
        };
        assert!(req.validate().is_err());
    }
}
