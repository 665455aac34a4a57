//! Friendship endpoints.
//!
//! # Endpoints
//!
//! - `GET /v1/friends` - Accepted friends
//! - `GET /v1/friends/requests` - Incoming pending requests
//! - `POST /v1/friends/request` - Send a request
//! - `PUT /v1/friends/:friendship_id` - Accept or reject an incoming request
//! - `DELETE /v1/friends/:friendship_id` - Remove a friendship
//! - `GET /v1/friends/compare/:friend_id` - Progress comparison

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use questline_shared::{
    auth::middleware::AuthContext,
    friends::FriendRequest,
    models::{
        friendship::{Friendship, FriendshipStatus},
        user::PublicProfile,
    },
    progress::ProgressComparison,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{app::AppState, error::ApiResult};

/// Send friend request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequestBody {
    /// The user to befriend
    pub receiver_id: Uuid,
}

/// Respond-to-request body. ACCEPTED or REJECTED; PENDING is not a
/// valid response and reads as a 400.
#[derive(Debug, Deserialize)]
pub struct RespondBody {
    pub status: FriendshipStatus,
}

/// The authenticated user's accepted friends as public profiles.
pub async fn list_friends(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<PublicProfile>>> {
    let friends = state.friends.list_friends(auth.user_id).await?;

    Ok(Json(friends))
}

/// Incoming pending requests, each with the sender's public profile.
pub async fn list_requests(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<FriendRequest>>> {
    let requests = state.friends.list_incoming_requests(auth.user_id).await?;

    Ok(Json(requests))
}

/// Sends a friend request.
///
/// # Errors
///
/// - `400 Bad Request`: sending to yourself
/// - `404 Not Found`: receiver does not exist
/// - `409 Conflict`: a friendship already exists between the pair, in
///   either direction and in any state
pub async fn send_request(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(body): Json<SendRequestBody>,
) -> ApiResult<(StatusCode, Json<Friendship>)> {
    let friendship = state
        .friends
        .send_request(auth.user_id, body.receiver_id)
        .await?;

    Ok((StatusCode::CREATED, Json(friendship)))
}

/// Accepts or rejects an incoming request. Only the receiver may respond,
/// and only while the request is still pending.
pub async fn respond_to_request(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(friendship_id): Path<Uuid>,
    Json(body): Json<RespondBody>,
) -> ApiResult<Json<Friendship>> {
    let friendship = state
        .friends
        .respond_to_request(friendship_id, auth.user_id, body.status)
        .await?;

    Ok(Json(friendship))
}

/// Removes a friendship. Either participant may remove it, whatever its
/// state; the pair may then start over with a fresh request.
pub async fn remove_friend(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(friendship_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .friends
        .remove_friend(friendship_id, auth.user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Side-by-side progress for the authenticated user and another user.
pub async fn compare_progress(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(friend_id): Path<Uuid>,
) -> ApiResult<Json<ProgressComparison>> {
    let comparison = state.progress.compare(auth.user_id, friend_id).await?;

    Ok(Json(comparison))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_respond_body_wire_format() {
        let body: RespondBody = serde_json::from_str(r#"{"status": "ACCEPTED"}"#).unwrap();
        assert_eq!(body.status, FriendshipStatus::Accepted);

        let body: RespondBody = serde_json::from_str(r#"{"status": "REJECTED"}"#).unwrap();
        assert_eq!(body.status, FriendshipStatus::Rejected);

        assert!(serde_json::from_str::<RespondBody>(r#"{"status": "BLOCKED"}"#).is_err());
    }

    #[test]
    fn test_send_request_body_camel_case() {
        let body: SendRequestBody = serde_json::from_str(
            r#"{"receiverId": "7e2c9d8a-1b7f-4f08-9a43-1f6a9c2d5e01"}"#,
        )
        .unwrap();
        assert_eq!(
            body.receiver_id.to_string(),
            "7e2c9d8a-1b7f-4f08-9a43-1f6a9c2d5e01"
        );
    }
}
