//! The friendship lifecycle.
//!
//! A request moves `PENDING -> ACCEPTED | REJECTED`, resolved only by its
//! receiver. Both outcomes are terminal: the row persists either way, and
//! because at most one row may exist per unordered user pair, a rejected
//! pair can never request again. Either participant may delete the row at
//! any point, which is the only way out of a terminal status.
//!
//! The one-row-per-pair rule is checked here for a friendly error and
//! enforced by the `friendships_pair_idx` unique index for the concurrent
//! case; both paths surface as the same `Conflict`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::db::store::Store;
use crate::error::{CoreError, CoreResult};
use crate::models::friendship::{Friendship, FriendshipStatus};
use crate::models::user::{PublicProfile, User};

/// Conflict message for a pair that already has a row, in any status.
pub const REQUEST_EXISTS: &str = "Friendship request already exists";

/// An incoming pending request with the sender's public profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub sender: PublicProfile,
}

/// Manages friendship requests, responses, and listings.
///
/// Constructed once at startup with the process's [`Store`] handle.
#[derive(Debug, Clone)]
pub struct Friends {
    store: Store,
}

impl Friends {
    pub fn new(store: Store) -> Self {
        Friends { store }
    }

    /// Sends a friend request, creating a pending row.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Validation`] - sender and receiver are the same user
    /// - [`CoreError::NotFound`] - receiver does not exist
    /// - [`CoreError::Conflict`] - a row for this pair already exists, in
    ///   either direction and any status (including `REJECTED`)
    /// - [`CoreError::Storage`] - database failure
    pub async fn send_request(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
    ) -> CoreResult<Friendship> {
        if sender_id == receiver_id {
            return Err(CoreError::Validation(
                "Cannot send a friend request to yourself".to_string(),
            ));
        }

        User::find_by_id(self.store.pool(), receiver_id)
            .await?
            .ok_or(CoreError::NotFound("User"))?;

        if Friendship::pair_exists(self.store.pool(), sender_id, receiver_id).await? {
            return Err(CoreError::Conflict(REQUEST_EXISTS.to_string()));
        }

        // The pair index backstops concurrent sends that slip past the
        // check above; map the violation to the same conflict.
        let friendship = Friendship::create(self.store.pool(), sender_id, receiver_id)
            .await
            .map_err(|e| {
                if is_pair_violation(&e) {
                    CoreError::Conflict(REQUEST_EXISTS.to_string())
                } else {
                    CoreError::Storage(e)
                }
            })?;

        info!(
            sender_id = %sender_id,
            receiver_id = %receiver_id,
            friendship_id = %friendship.id,
            "Friend request sent"
        );

        Ok(friendship)
    }

    /// Accepts or rejects a pending request.
    ///
    /// Only the receiver of that specific pending row may respond; a wrong
    /// caller, an already-resolved row, and a nonexistent id all come back
    /// as the same `NotFound`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Validation`] - `decision` is not `Accepted`/`Rejected`
    /// - [`CoreError::NotFound`] - no pending row with this id and receiver
    /// - [`CoreError::Storage`] - database failure
    pub async fn respond_to_request(
        &self,
        friendship_id: Uuid,
        user_id: Uuid,
        decision: FriendshipStatus,
    ) -> CoreResult<Friendship> {
        if !decision.is_resolved() {
            return Err(CoreError::Validation(
                "Response must be ACCEPTED or REJECTED".to_string(),
            ));
        }

        let friendship = Friendship::respond(self.store.pool(), friendship_id, user_id, decision)
            .await?
            .ok_or(CoreError::NotFound("Friendship request"))?;

        info!(
            friendship_id = %friendship_id,
            user_id = %user_id,
            status = decision.as_str(),
            "Friend request resolved"
        );

        Ok(friendship)
    }

    /// Deletes a friendship row. Works whatever the status; either
    /// participant may call it.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] - no row with this id involving the caller
    /// - [`CoreError::Storage`] - database failure
    pub async fn remove_friend(&self, friendship_id: Uuid, user_id: Uuid) -> CoreResult<()> {
        let deleted =
            Friendship::delete_for_participant(self.store.pool(), friendship_id, user_id).await?;

        if !deleted {
            return Err(CoreError::NotFound("Friendship"));
        }

        info!(friendship_id = %friendship_id, user_id = %user_id, "Friendship removed");
        Ok(())
    }

    /// The other participant of every accepted friendship the user is in.
    pub async fn list_friends(&self, user_id: Uuid) -> CoreResult<Vec<PublicProfile>> {
        let profiles = Friendship::list_friend_profiles(self.store.pool(), user_id).await?;
        Ok(profiles)
    }

    /// Pending requests addressed to the user, newest first.
    pub async fn list_incoming_requests(&self, user_id: Uuid) -> CoreResult<Vec<FriendRequest>> {
        let rows = Friendship::list_incoming_pending(self.store.pool(), user_id).await?;

        Ok(rows
            .into_iter()
            .map(|row| FriendRequest {
                id: row.id,
                created_at: row.created_at,
                sender: PublicProfile {
                    id: row.sender_id,
                    username: row.username,
                    first_name: row.first_name,
                    last_name: row.last_name,
                    avatar_url: row.avatar_url,
                    level: row.level,
                    points: row.points,
                },
            })
            .collect())
    }
}

/// True when the error is the pair-uniqueness index firing.
fn is_pair_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err)
            if db_err.constraint() == Some("friendships_pair_idx")
    )
}
