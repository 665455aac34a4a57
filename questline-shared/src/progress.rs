//! Read-side progress aggregation.
//!
//! Combines a user's stored points/coins/level with two counts computed at
//! read time: lifetime habit completions and tasks currently completed.
//! Nothing here takes a joint snapshot; a completion committing between the
//! reads is tolerated. Comparison runs both sides concurrently with no
//! coordination between them.

use serde::Serialize;
use uuid::Uuid;

use crate::db::store::Store;
use crate::error::{CoreError, CoreResult};
use crate::models::habit::HabitCompletion;
use crate::models::task::Task;
use crate::models::user::User;

/// A user's progress snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub id: Uuid,
    pub username: String,
    pub points: i32,
    pub coins: i32,
    pub level: i32,
    pub habits_completed: i64,
    pub tasks_completed: i64,
}

/// Two progress snapshots side by side.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressComparison {
    pub user: UserProgress,
    pub friend: UserProgress,
}

/// Computes progress views over the store.
///
/// Constructed once at startup with the process's [`Store`] handle.
#[derive(Debug, Clone)]
pub struct Progress {
    store: Store,
}

impl Progress {
    pub fn new(store: Store) -> Self {
        Progress { store }
    }

    /// The progress snapshot for one user.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] - user does not exist
    /// - [`CoreError::Storage`] - database failure
    pub async fn for_user(&self, user_id: Uuid) -> CoreResult<UserProgress> {
        let pool = self.store.pool();

        let user = User::find_by_id(pool, user_id)
            .await?
            .ok_or(CoreError::NotFound("User"))?;

        let (habits_completed, tasks_completed) = tokio::try_join!(
            HabitCompletion::count_for_user(pool, user_id),
            Task::count_completed_for_user(pool, user_id),
        )?;

        Ok(UserProgress {
            id: user.id,
            username: user.username,
            points: user.points,
            coins: user.coins,
            level: user.level,
            habits_completed,
            tasks_completed,
        })
    }

    /// Both users' snapshots, read independently and concurrently.
    ///
    /// No friendship check; any two existing users compare.
    pub async fn compare(&self, user_id: Uuid, friend_id: Uuid) -> CoreResult<ProgressComparison> {
        let (user, friend) = tokio::try_join!(self.for_user(user_id), self.for_user(friend_id))?;

        Ok(ProgressComparison { user, friend })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_serializes_camel_case() {
        let progress = UserProgress {
            id: Uuid::new_v4(),
            username: "ada".to_string(),
            points: 120,
            coins: 45,
            level: 2,
            habits_completed: 8,
            tasks_completed: 3,
        };

        let json = serde_json::to_value(&progress).unwrap();
        assert_eq!(json["habitsCompleted"], 8);
        assert_eq!(json["tasksCompleted"], 3);
        assert!(json.get("habits_completed").is_none());
    }

    #[test]
    fn test_comparison_keeps_both_sides() {
        let side = |name: &str| UserProgress {
            id: Uuid::new_v4(),
            username: name.to_string(),
            points: 0,
            coins: 0,
            level: 1,
            habits_completed: 0,
            tasks_completed: 0,
        };

        let comparison = ProgressComparison {
            user: side("ada"),
            friend: side("grace"),
        };

        let json = serde_json::to_value(&comparison).unwrap();
        assert_eq!(json["user"]["username"], "ada");
        assert_eq!(json["friend"]["username"], "grace");
    }
}
