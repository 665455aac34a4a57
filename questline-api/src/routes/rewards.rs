//! Reward catalog, redemption, and progress endpoints.
//!
//! # Endpoints
//!
//! - `GET /v1/rewards` - Active reward catalog (public)
//! - `POST /v1/rewards/:reward_id/redeem` - Spend coins on a reward
//! - `GET /v1/progress` - Own progress summary

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use questline_shared::{
    auth::middleware::AuthContext,
    models::reward::{Reward, UserReward},
    progress::UserProgress,
};
use uuid::Uuid;

use crate::{app::AppState, error::ApiResult};

/// The active reward catalog, cheapest first. No authentication required;
/// browsing the catalog is how prospective users see what coins buy.
pub async fn list_rewards(State(state): State<AppState>) -> ApiResult<Json<Vec<Reward>>> {
    let rewards = state.exchange.list_rewards().await?;

    Ok(Json(rewards))
}

/// Redeems a reward for the authenticated user.
///
/// The debit and the redemption record commit together; an insufficient
/// balance rolls both back.
///
/// # Errors
///
/// - `404 Not Found`: reward missing or retired
/// - `400 Bad Request`: balance does not cover the cost
pub async fn redeem(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(reward_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<UserReward>)> {
    let redemption = state.exchange.redeem(reward_id, auth.user_id).await?;

    Ok((StatusCode::CREATED, Json(redemption)))
}

/// The authenticated user's progress summary: balances, level, and
/// lifetime completion counts.
pub async fn get_progress(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<UserProgress>> {
    let progress = state.progress.for_user(auth.user_id).await?;

    Ok(Json(progress))
}
