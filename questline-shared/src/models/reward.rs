//! Reward catalog model and database operations.
//!
//! Rewards are system-wide (not per-user) and priced in coins. Admins
//! manage the catalog; users redeem through the exchange, which pairs the
//! [`UserReward`] redemption row with the conditional coin debit in one
//! unit of work.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE rewards (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     name VARCHAR(100) NOT NULL,
//!     description VARCHAR(500),
//!     cost INTEGER NOT NULL CHECK (cost > 0),
//!     icon VARCHAR(30),
//!     is_active BOOLEAN NOT NULL DEFAULT TRUE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//!
//! CREATE TABLE user_rewards (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     reward_id UUID NOT NULL REFERENCES rewards(id) ON DELETE CASCADE,
//!     redeemed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// A redeemable reward in the catalog.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: Uuid,

    pub name: String,

    pub description: Option<String>,

    /// Price in coins, always positive
    pub cost: i32,

    pub icon: Option<String>,

    /// Inactive rewards stay for historical redemptions but can't be
    /// redeemed or listed
    pub is_active: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// One redemption of a reward by a user.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserReward {
    pub id: Uuid,
    pub user_id: Uuid,
    pub reward_id: Uuid,
    pub redeemed_at: DateTime<Utc>,
}

/// Input for creating a catalog entry (admin).
#[derive(Debug, Clone)]
pub struct CreateReward {
    pub name: String,
    pub description: Option<String>,
    pub cost: i32,
    pub icon: Option<String>,
}

/// Partial catalog update (admin); only non-None fields are written.
#[derive(Debug, Clone, Default)]
pub struct UpdateRewardFields {
    pub name: Option<String>,
    pub description: Option<String>,
    pub cost: Option<i32>,
    pub icon: Option<String>,
    pub is_active: Option<bool>,
}

const REWARD_COLUMNS: &str = "id, name, description, cost, icon, is_active, created_at, updated_at";

impl Reward {
    /// Creates a new active catalog entry.
    pub async fn create(pool: &PgPool, data: CreateReward) -> Result<Self, sqlx::Error> {
        let reward = sqlx::query_as::<_, Reward>(&format!(
            r#"
            INSERT INTO rewards (name, description, cost, icon)
            VALUES ($1, $2, $3, $4)
            RETURNING {REWARD_COLUMNS}
            "#,
        ))
        .bind(data.name)
        .bind(data.description)
        .bind(data.cost)
        .bind(data.icon)
        .fetch_one(pool)
        .await?;

        Ok(reward)
    }

    /// Finds a reward only if it is active (the exchange's precondition).
    pub async fn find_active_by_id(
        executor: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let reward = sqlx::query_as::<_, Reward>(&format!(
            "SELECT {REWARD_COLUMNS} FROM rewards WHERE id = $1 AND is_active = TRUE",
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(reward)
    }

    /// Lists active rewards, cheapest first.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let rewards = sqlx::query_as::<_, Reward>(&format!(
            r#"
            SELECT {REWARD_COLUMNS}
            FROM rewards
            WHERE is_active = TRUE
            ORDER BY cost ASC
            "#,
        ))
        .fetch_all(pool)
        .await?;

        Ok(rewards)
    }

    /// Applies a partial update (admin). Returns `None` if the reward
    /// doesn't exist.
    pub async fn update_fields(
        pool: &PgPool,
        id: Uuid,
        data: UpdateRewardFields,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE rewards SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${bind_count}"));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${bind_count}"));
        }
        if data.cost.is_some() {
            bind_count += 1;
            query.push_str(&format!(", cost = ${bind_count}"));
        }
        if data.icon.is_some() {
            bind_count += 1;
            query.push_str(&format!(", icon = ${bind_count}"));
        }
        if data.is_active.is_some() {
            bind_count += 1;
            query.push_str(&format!(", is_active = ${bind_count}"));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {REWARD_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Reward>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(cost) = data.cost {
            q = q.bind(cost);
        }
        if let Some(icon) = data.icon {
            q = q.bind(icon);
        }
        if let Some(is_active) = data.is_active {
            q = q.bind(is_active);
        }

        let reward = q.fetch_optional(pool).await?;

        Ok(reward)
    }

    /// Deletes a catalog entry (admin).
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM rewards WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl UserReward {
    /// Inserts a redemption row.
    ///
    /// Runs on any executor; the exchange calls it inside a unit of work so
    /// a failed debit rolls the row back.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        user_id: Uuid,
        reward_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let user_reward = sqlx::query_as::<_, UserReward>(
            r#"
            INSERT INTO user_rewards (user_id, reward_id)
            VALUES ($1, $2)
            RETURNING id, user_id, reward_id, redeemed_at
            "#,
        )
        .bind(user_id)
        .bind(reward_id)
        .fetch_one(executor)
        .await?;

        Ok(user_reward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reward_serializes_camel_case() {
        let reward = Reward {
            id: Uuid::new_v4(),
            name: "Movie night".to_string(),
            description: None,
            cost: 50,
            icon: Some("film".to_string()),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&reward).unwrap();
        assert_eq!(json["isActive"], true);
        assert_eq!(json["cost"], 50);
        assert!(json.get("is_active").is_none());
    }

    #[test]
    fn test_update_fields_default_is_empty() {
        let update = UpdateRewardFields::default();
        assert!(update.name.is_none());
        assert!(update.cost.is_none());
        assert!(update.is_active.is_none());
    }
}
