//! Profile endpoints.
//!
//! # Endpoints
//!
//! - `GET /v1/users/profile` - Own profile (private view)
//! - `PUT /v1/users/profile` - Update own profile
//! - `GET /v1/users/:user_id` - Another user's public profile

use axum::{
    extract::{Path, State},
    Json,
};
use questline_shared::{
    auth::middleware::AuthContext,
    models::user::{PrivateProfile, PublicProfile, UpdateProfile, User},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Profile update request. All fields optional; absent fields are untouched.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(
        length(min = 3, max = 30, message = "Username must be 3-30 characters"),
        custom(function = "super::auth::validate_username_charset")
    )]
    pub username: Option<String>,

    #[validate(length(max = 50, message = "First name must be at most 50 characters"))]
    pub first_name: Option<String>,

    #[validate(length(max = 50, message = "Last name must be at most 50 characters"))]
    pub last_name: Option<String>,

    #[validate(
        length(max = 512, message = "Avatar URL must be at most 512 characters"),
        url(message = "Avatar URL must be a valid URL")
    )]
    pub avatar_url: Option<String>,
}

/// The authenticated user's own profile.
pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<PrivateProfile>> {
    let user = User::find_by_id(state.store.pool(), auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(PrivateProfile::from(user)))
}

/// Updates the authenticated user's profile.
///
/// # Errors
///
/// - `409 Conflict`: requested username belongs to another user
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<PrivateProfile>> {
    req.validate()?;

    if let Some(ref username) = req.username {
        if User::username_taken(state.store.pool(), username, auth.user_id).await? {
            return Err(ApiError::Conflict("Username already taken".to_string()));
        }
    }

    let user = User::update_profile(
        state.store.pool(),
        auth.user_id,
        UpdateProfile {
            username: req.username,
            first_name: req.first_name,
            last_name: req.last_name,
            avatar_url: req.avatar_url,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user.id, "Profile updated");

    Ok(Json(PrivateProfile::from(user)))
}

/// Another user's public profile. Visible to any authenticated user; the
/// private fields (email, coins, role) never leave this view.
pub async fn get_public_profile(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<PublicProfile>> {
    let user = User::find_by_id(state.store.pool(), user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(PublicProfile::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_profile_request_all_optional() {
        let req = UpdateProfileRequest {
            username: None,
            first_name: None,
            last_name: None,
            avatar_url: None,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_update_profile_rejects_bad_avatar_url() {
        let req = UpdateProfileRequest {
            username: None,
            first_name: None,
            last_name: None,
            avatar_url: Some("not a url".to_string()),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_profile_rejects_short_username() {
        let req = UpdateProfileRequest {
            username: Some("ab".to_string()),
            first_name: None,
            last_name: None,
            avatar_url: None,
        };
        assert!(req.validate().is_err());
    }
}
