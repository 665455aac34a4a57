//! Administrative endpoints. Every route here sits behind the admin gate.
//!
//! # Endpoints
//!
//! - `GET /v1/admin/users` - Paginated user listing
//! - `PUT /v1/admin/users/:user_id` - Set a user's role
//! - `GET /v1/admin/stats` - System-wide counters
//! - `POST /v1/admin/rewards` - Create a reward
//! - `PUT /v1/admin/rewards/:reward_id` - Update a reward
//! - `DELETE /v1/admin/rewards/:reward_id` - Delete a reward

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use questline_shared::models::{
    habit::{Habit, HabitCompletion},
    reward::{CreateReward, Reward, UpdateRewardFields},
    task::Task,
    user::{PrivateProfile, Role, User},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// User listing pagination
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    /// 1-based page number
    pub page: Option<i64>,

    /// Page size, capped at 100
    pub limit: Option<i64>,
}

/// Paginated user listing response
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<PrivateProfile>,
    pub meta: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

/// Set role request
#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    /// USER or ADMIN
    pub role: Role,
}

/// System-wide counters
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_users: i64,
    pub total_habits: i64,
    pub total_tasks: i64,
    pub total_completions: i64,
}

/// Create reward request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRewardRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    /// Coin cost, strictly positive
    #[validate(range(min = 1, message = "Cost must be at least 1"))]
    pub cost: i32,

    #[validate(length(max = 30, message = "Icon must be at most 30 characters"))]
    pub icon: Option<String>,
}

/// Update reward request. All fields optional; absent fields are untouched.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRewardRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    #[validate(range(min = 1, message = "Cost must be at least 1"))]
    pub cost: Option<i32>,

    #[validate(length(max = 30, message = "Icon must be at most 30 characters"))]
    pub icon: Option<String>,

    pub is_active: Option<bool>,
}

/// Lists users with pagination, newest first. Admins see the private view
/// including email, role, and balances.
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<UserListResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1) * limit;

    let total = User::count(state.store.pool()).await?;
    let users = User::list(state.store.pool(), limit, offset).await?;

    let total_pages = if total == 0 {
        0
    } else {
        (total + limit - 1) / limit
    };

    Ok(Json(UserListResponse {
        users: users.into_iter().map(PrivateProfile::from).collect(),
        meta: PaginationMeta {
            page,
            limit,
            total,
            total_pages,
        },
    }))
}

/// Sets a user's role.
pub async fn set_user_role(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<SetRoleRequest>,
) -> ApiResult<Json<PrivateProfile>> {
    let user = User::set_role(state.store.pool(), user_id, req.role)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "User role changed");

    Ok(Json(PrivateProfile::from(user)))
}

/// System-wide counters: users, habits, tasks, and habit completions.
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let (total_users, total_habits, total_tasks, total_completions) = tokio::try_join!(
        User::count(state.store.pool()),
        Habit::count_all(state.store.pool()),
        Task::count_all(state.store.pool()),
        HabitCompletion::count_all(state.store.pool()),
    )?;

    Ok(Json(StatsResponse {
        total_users,
        total_habits,
        total_tasks,
        total_completions,
    }))
}

/// Adds a reward to the catalog.
pub async fn create_reward(
    State(state): State<AppState>,
    Json(req): Json<CreateRewardRequest>,
) -> ApiResult<(StatusCode, Json<Reward>)> {
    req.validate()?;

    let reward = Reward::create(
        state.store.pool(),
        CreateReward {
            name: req.name,
            description: req.description,
            cost: req.cost,
            icon: req.icon,
        },
    )
    .await?;

    tracing::info!(reward_id = %reward.id, cost = reward.cost, "Reward created");

    Ok((StatusCode::CREATED, Json(reward)))
}

/// Updates a reward. Deactivating (`isActive: false`) retires it from the
/// catalog without touching past redemptions.
pub async fn update_reward(
    State(state): State<AppState>,
    Path(reward_id): Path<Uuid>,
    Json(req): Json<UpdateRewardRequest>,
) -> ApiResult<Json<Reward>> {
    req.validate()?;

    let reward = Reward::update_fields(
        state.store.pool(),
        reward_id,
        UpdateRewardFields {
            name: req.name,
            description: req.description,
            cost: req.cost,
            icon: req.icon,
            is_active: req.is_active,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Reward not found".to_string()))?;

    Ok(Json(reward))
}

/// Deletes a reward outright, cascading to its redemption history.
/// Deactivating via update is the way to retire a reward while keeping
/// that history.
pub async fn delete_reward(
    State(state): State<AppState>,
    Path(reward_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let deleted = Reward::delete(state.store.pool(), reward_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Reward not found".to_string()));
    }

    tracing::info!(reward_id = %reward_id, "Reward deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_reward_request_validation() {
        let req = CreateRewardRequest {
            name: "Movie night".to_string(),
            description: None,
            cost: 50,
            icon: None,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_reward_rejects_zero_cost() {
        let req = CreateRewardRequest {
            name: "Freebie".to_string(),
            description: None,
            cost: 0,
            icon: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_set_role_wire_format() {
        let req: SetRoleRequest = serde_json::from_str(r#"{"role": "ADMIN"}"#).unwrap();
        assert_eq!(req.role, Role::Admin);
    }

    #[test]
    fn test_pagination_meta_defaults() {
        let total: i64 = 45;
        let limit: i64 = 20;
        let total_pages = (total + limit - 1) / limit;
        assert_eq!(total_pages, 3);
    }
}
