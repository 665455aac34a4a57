//! User model and database operations.
//!
//! Users own habits, tasks, and redemptions, and carry the gamification
//! state: a points total, a spendable coin balance, and a level. Points and
//! coins only ever move through the relative-increment statements here
//! ([`User::apply_award`], [`User::debit_coins`]) so concurrent writers can
//! never clobber each other with stale absolute values.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE users (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     email VARCHAR(255) NOT NULL UNIQUE,
//!     username VARCHAR(30) NOT NULL UNIQUE,
//!     password_hash VARCHAR(255) NOT NULL,
//!     first_name VARCHAR(50),
//!     last_name VARCHAR(50),
//!     avatar_url VARCHAR(512),
//!     role user_role NOT NULL DEFAULT 'user',
//!     points INTEGER NOT NULL DEFAULT 0 CHECK (points >= 0),
//!     coins INTEGER NOT NULL DEFAULT 0 CHECK (coins >= 0),
//!     level INTEGER NOT NULL DEFAULT 1 CHECK (level >= 1),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! # Example
//!
//! ```no_run
//! use questline_shared::models::user::{CreateUser, User};
//! # use sqlx::PgPool;
//!
//! # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
//! let user = User::create(
//!     &pool,
//!     CreateUser {
//!         email: "ada@example.com".to_string(),
//!         username: "ada".to_string(),
//!         password_hash: "$argon2id$...".to_string(),
//!         first_name: Some("Ada".to_string()),
//!         last_name: None,
//!     },
//! )
//! .await?;
//!
//! println!("Created user {} at level {}", user.username, user.level);
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Account role. A closed set: every boundary check matches exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// The storage label for this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

/// User account with gamification state.
///
/// Passwords are stored as Argon2id hashes, never in plaintext, and the
/// hash is excluded from serialization.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address, unique across all users
    pub email: String,

    /// Public handle, unique, 3-30 chars of `[A-Za-z0-9_]`
    pub username: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub first_name: Option<String>,

    pub last_name: Option<String>,

    pub avatar_url: Option<String>,

    /// Account role (closed enum)
    pub role: Role,

    /// Lifetime points; only ever incremented by awards
    pub points: i32,

    /// Spendable coin balance; never below zero
    pub coins: i32,

    /// Advisory level, starts at 1; reported but never recomputed
    pub level: i32,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user. The password arrives already hashed.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Profile fields a user may change about themselves.
///
/// All fields are optional; only the present ones are written.
#[derive(Debug, Clone, Default)]
pub struct UpdateProfile {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// What any authenticated user may see about another user.
///
/// Deliberately excludes email, coins, and role.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: Uuid,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
    pub level: i32,
    pub points: i32,
}

impl From<User> for PublicProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            avatar_url: user.avatar_url,
            level: user.level,
            points: user.points,
        }
    }
}

/// What a user sees about their own account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateProfile {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub points: i32,
    pub coins: i32,
    pub level: i32,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PrivateProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            avatar_url: user.avatar_url,
            role: user.role,
            points: user.points,
            coins: user.coins,
            level: user.level,
            created_at: user.created_at,
        }
    }
}

const USER_COLUMNS: &str = "id, email, username, password_hash, first_name, last_name, \
                            avatar_url, role, points, coins, level, created_at, updated_at";

impl User {
    /// Creates a new user with default role, zero balances, and level 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the email or username is already taken (unique
    /// constraint violation) or the database is unreachable.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, username, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(data.email)
        .bind(data.username)
        .bind(data.password_hash)
        .bind(data.first_name)
        .bind(data.last_name)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID.
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address (used by login).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1",
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// True if any account already uses this email or username.
    ///
    /// Registration checks this first for a friendly conflict message; the
    /// unique constraints remain the authority under concurrency.
    pub async fn email_or_username_exists(
        pool: &PgPool,
        email: &str,
        username: &str,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 OR username = $2)",
        )
        .bind(email)
        .bind(username)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// True if another user (not `exclude_id`) already holds this username.
    pub async fn username_taken(
        pool: &PgPool,
        username: &str,
        exclude_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1 AND id <> $2)",
        )
        .bind(username)
        .bind(exclude_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Updates profile fields. Only non-None fields are written; the
    /// `updated_at` timestamp is always refreshed.
    ///
    /// # Returns
    ///
    /// The updated user, or `None` if the user doesn't exist.
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.username.is_some() {
            bind_count += 1;
            query.push_str(&format!(", username = ${bind_count}"));
        }
        if data.first_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", first_name = ${bind_count}"));
        }
        if data.last_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", last_name = ${bind_count}"));
        }
        if data.avatar_url.is_some() {
            bind_count += 1;
            query.push_str(&format!(", avatar_url = ${bind_count}"));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {USER_COLUMNS}"));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(username) = data.username {
            q = q.bind(username);
        }
        if let Some(first_name) = data.first_name {
            q = q.bind(first_name);
        }
        if let Some(last_name) = data.last_name {
            q = q.bind(last_name);
        }
        if let Some(avatar_url) = data.avatar_url {
            q = q.bind(avatar_url);
        }

        let user = q.fetch_optional(pool).await?;

        Ok(user)
    }

    /// Sets a user's role (admin operation).
    pub async fn set_role(
        pool: &PgPool,
        id: Uuid,
        role: Role,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}",
        ))
        .bind(id)
        .bind(role)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Credits an award to a user's balances.
    ///
    /// The increments are relative (`points = points + $2`) so the statement
    /// is correct under any interleaving; callers never read-then-write.
    /// Runs on any executor so it can join a unit of work with the award's
    /// evidence row.
    ///
    /// # Returns
    ///
    /// True if the user exists and was credited.
    pub async fn apply_award(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        points: i32,
        coins: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET points = points + $2,
                coins = coins + $3,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(points)
        .bind(coins)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Debits coins if and only if the balance covers the cost.
    ///
    /// The guard lives in the statement (`coins >= $2`), so two concurrent
    /// debits serialize on the row and the second sees the post-debit
    /// balance: the account can never be overdrawn.
    ///
    /// # Returns
    ///
    /// True if the debit happened; false if the balance was insufficient
    /// (or the user doesn't exist).
    pub async fn debit_coins(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        cost: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET coins = coins - $2,
                updated_at = NOW()
            WHERE id = $1 AND coins >= $2
            "#,
        )
        .bind(id)
        .bind(cost)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists users with pagination, newest first (admin listing).
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Counts all users.
    pub async fn count(executor: impl PgExecutor<'_>) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(executor)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            username: "ada".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            avatar_url: None,
            role: Role::User,
            points: 120,
            coins: 45,
            level: 2,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Admin.as_str(), "admin");
    }

    #[test]
    fn test_role_default_is_user() {
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn test_role_wire_format_is_uppercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        let role: Role = serde_json::from_str("\"USER\"").unwrap();
        assert_eq!(role, Role::User);
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "ada");
    }

    #[test]
    fn test_public_profile_excludes_sensitive_fields() {
        let profile = PublicProfile::from(sample_user());
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("email").is_none());
        assert!(json.get("coins").is_none());
        assert!(json.get("role").is_none());
        assert_eq!(json["level"], 2);
        assert_eq!(json["points"], 120);
    }

    #[test]
    fn test_private_profile_keeps_balances() {
        let profile = PrivateProfile::from(sample_user());
        assert_eq!(profile.coins, 45);
        assert_eq!(profile.points, 120);
        assert_eq!(profile.role, Role::User);
    }

    #[test]
    fn test_update_profile_default_is_empty() {
        let update = UpdateProfile::default();
        assert!(update.username.is_none());
        assert!(update.first_name.is_none());
        assert!(update.last_name.is_none());
        assert!(update.avatar_url.is_none());
    }
}
