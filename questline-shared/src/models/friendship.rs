//! Friendship model and database operations.
//!
//! A friendship is a single row per unordered user pair, created by the
//! sender in `pending` status and resolved by the receiver. The unique
//! index over `(LEAST(sender, receiver), GREATEST(sender, receiver))`
//! guarantees the one-row-per-pair rule even against concurrent sends in
//! opposite directions.
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE friendship_status AS ENUM ('pending', 'accepted', 'rejected');
//!
//! CREATE TABLE friendships (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     sender_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     receiver_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     status friendship_status NOT NULL DEFAULT 'pending',
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     CONSTRAINT friendships_no_self CHECK (sender_id <> receiver_id)
//! );
//!
//! CREATE UNIQUE INDEX friendships_pair_idx
//!     ON friendships (LEAST(sender_id, receiver_id), GREATEST(sender_id, receiver_id));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::PublicProfile;

/// Lifecycle of a friendship request.
///
/// `Rejected` is terminal for the pair: the row stays, so neither side can
/// ever send a new request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "friendship_status", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Rejected,
}

impl FriendshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendshipStatus::Pending => "pending",
            FriendshipStatus::Accepted => "accepted",
            FriendshipStatus::Rejected => "rejected",
        }
    }

    /// True once the receiver has answered, either way.
    pub fn is_resolved(&self) -> bool {
        matches!(self, FriendshipStatus::Accepted | FriendshipStatus::Rejected)
    }
}

/// One friendship row between two users.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Friendship {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Flat row for an incoming pending request joined with the sender's
/// public fields. The friends component nests it for the wire.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IncomingRequestRow {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub sender_id: Uuid,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
    pub level: i32,
    pub points: i32,
}

const FRIENDSHIP_COLUMNS: &str = "id, sender_id, receiver_id, status, created_at, updated_at";

impl Friendship {
    /// Inserts a pending request from sender to receiver.
    ///
    /// A concurrent duplicate (either direction) trips
    /// `friendships_pair_idx`; callers map that violation to a conflict.
    pub async fn create(
        pool: &PgPool,
        sender_id: Uuid,
        receiver_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let friendship = sqlx::query_as::<_, Friendship>(&format!(
            r#"
            INSERT INTO friendships (sender_id, receiver_id)
            VALUES ($1, $2)
            RETURNING {FRIENDSHIP_COLUMNS}
            "#,
        ))
        .bind(sender_id)
        .bind(receiver_id)
        .fetch_one(pool)
        .await?;

        Ok(friendship)
    }

    /// True if any row exists for this pair, in either direction and any
    /// status.
    pub async fn pair_exists(pool: &PgPool, a: Uuid, b: Uuid) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM friendships
                WHERE (sender_id = $1 AND receiver_id = $2)
                   OR (sender_id = $2 AND receiver_id = $1)
            )
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Resolves a pending request, conditioned on the caller being the
    /// receiver and the row still being pending.
    ///
    /// A single conditional update: wrong user, wrong status, or missing id
    /// all come back as `None`, indistinguishable by design.
    pub async fn respond(
        pool: &PgPool,
        id: Uuid,
        receiver_id: Uuid,
        status: FriendshipStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let friendship = sqlx::query_as::<_, Friendship>(&format!(
            r#"
            UPDATE friendships
            SET status = $3,
                updated_at = NOW()
            WHERE id = $1 AND receiver_id = $2 AND status = 'pending'
            RETURNING {FRIENDSHIP_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(receiver_id)
        .bind(status)
        .fetch_optional(pool)
        .await?;

        Ok(friendship)
    }

    /// Deletes a friendship if the caller is one of its two participants,
    /// whatever its status.
    pub async fn delete_for_participant(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM friendships WHERE id = $1 AND (sender_id = $2 OR receiver_id = $2)",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// The public profile of the OTHER participant of every accepted
    /// friendship the user is part of.
    ///
    /// Symmetric by construction: after an accept, both sides see each
    /// other here.
    pub async fn list_friend_profiles(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<PublicProfile>, sqlx::Error> {
        let profiles = sqlx::query_as::<_, PublicProfile>(
            r#"
            SELECT u.id, u.username, u.first_name, u.last_name, u.avatar_url, u.level, u.points
            FROM friendships f
            JOIN users u
              ON u.id = CASE WHEN f.sender_id = $1 THEN f.receiver_id ELSE f.sender_id END
            WHERE f.status = 'accepted'
              AND (f.sender_id = $1 OR f.receiver_id = $1)
            ORDER BY u.username ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(profiles)
    }

    /// Pending requests addressed to `user_id`, newest first, with the
    /// sender's public fields.
    pub async fn list_incoming_pending(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<IncomingRequestRow>, sqlx::Error> {
        let rows = sqlx::query_as::<_, IncomingRequestRow>(
            r#"
            SELECT f.id, f.created_at,
                   u.id AS sender_id, u.username, u.first_name, u.last_name,
                   u.avatar_url, u.level, u.points
            FROM friendships f
            JOIN users u ON u.id = f.sender_id
            WHERE f.receiver_id = $1 AND f.status = 'pending'
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(FriendshipStatus::Pending.as_str(), "pending");
        assert_eq!(FriendshipStatus::Accepted.as_str(), "accepted");
        assert_eq!(FriendshipStatus::Rejected.as_str(), "rejected");
    }

    #[test]
    fn test_status_resolution() {
        assert!(!FriendshipStatus::Pending.is_resolved());
        assert!(FriendshipStatus::Accepted.is_resolved());
        assert!(FriendshipStatus::Rejected.is_resolved());
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&FriendshipStatus::Accepted).unwrap(),
            "\"ACCEPTED\""
        );
        let status: FriendshipStatus = serde_json::from_str("\"REJECTED\"").unwrap();
        assert_eq!(status, FriendshipStatus::Rejected);
    }
}
