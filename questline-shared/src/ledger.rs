//! The points/coins ledger.
//!
//! Completing a habit or a task is worth a fixed award:
//!
//! | Event            | Points | Coins |
//! |------------------|--------|-------|
//! | Habit completion | 10     | 5     |
//! | Task completion  | 15     | 10    |
//!
//! Every award is written in one unit of work together with its evidence
//! (the completion row, or the task's `completed_at` stamp): both land or
//! neither does. Balance changes are relative increments, so no award can
//! clobber a concurrent one, and points only ever go up.
//!
//! # Example
//!
//! ```no_run
//! use questline_shared::db::store::Store;
//! use questline_shared::ledger::Ledger;
//! # use uuid::Uuid;
//!
//! # async fn example(store: Store, habit_id: Uuid, user_id: Uuid)
//! #     -> Result<(), questline_shared::error::CoreError> {
//! let ledger = Ledger::new(store);
//! let completion = ledger.complete_habit(habit_id, user_id, None).await?;
//! println!("completed at {}", completion.completed_at);
//! # Ok(())
//! # }
//! ```

use tracing::{debug, info};
use uuid::Uuid;

use crate::db::store::Store;
use crate::error::{CoreError, CoreResult};
use crate::models::habit::{Habit, HabitCompletion};
use crate::models::task::{Task, TaskStatus, UpdateTaskFields};
use crate::models::user::User;

/// Points awarded for completing a habit.
pub const HABIT_COMPLETION_POINTS: i32 = 10;
/// Coins awarded for completing a habit.
pub const HABIT_COMPLETION_COINS: i32 = 5;
/// Points awarded for completing a task.
pub const TASK_COMPLETION_POINTS: i32 = 15;
/// Coins awarded for completing a task.
pub const TASK_COMPLETION_COINS: i32 = 10;

/// True when an update would move a task INTO completed status.
///
/// This is the whole award rule: the requested status must be `Completed`
/// and the task must not already be there. Re-asserting `Completed`, or any
/// update that doesn't touch status, never awards. A task that left
/// `Completed` and comes back awards again; that is a new transition.
pub fn entering_completed(current: TaskStatus, requested: Option<TaskStatus>) -> bool {
    matches!(requested, Some(TaskStatus::Completed)) && !current.is_completed()
}

/// Awards points and coins for habit and task completion.
///
/// Constructed once at startup with the process's [`Store`] handle.
#[derive(Debug, Clone)]
pub struct Ledger {
    store: Store,
}

impl Ledger {
    pub fn new(store: Store) -> Self {
        Ledger { store }
    }

    /// Records a habit completion and credits the owner.
    ///
    /// The habit must exist, belong to `user_id`, and be active; anything
    /// else is `NotFound` and nothing is written. The completion row and
    /// the +10/+5 credit commit together. Completing the same habit many
    /// times a day is allowed; each completion awards independently.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] - habit missing, foreign, or inactive
    /// - [`CoreError::Storage`] - database failure
    pub async fn complete_habit(
        &self,
        habit_id: Uuid,
        user_id: Uuid,
        note: Option<String>,
    ) -> CoreResult<HabitCompletion> {
        Habit::find_active_by_id_and_owner(self.store.pool(), habit_id, user_id)
            .await?
            .ok_or(CoreError::NotFound("Habit"))?;

        let mut uow = self.store.begin().await?;

        let completion = HabitCompletion::create(uow.conn(), habit_id, user_id, note).await?;

        let credited = User::apply_award(
            uow.conn(),
            user_id,
            HABIT_COMPLETION_POINTS,
            HABIT_COMPLETION_COINS,
        )
        .await?;
        if !credited {
            // Owner row vanished between the lookup and the credit.
            uow.rollback().await?;
            return Err(CoreError::NotFound("User"));
        }

        uow.commit().await?;

        info!(
            user_id = %user_id,
            habit_id = %habit_id,
            points = HABIT_COMPLETION_POINTS,
            coins = HABIT_COMPLETION_COINS,
            "Habit completion awarded"
        );

        Ok(completion)
    }

    /// Applies a task update, awarding if it completes the task.
    ///
    /// When `changes` moves the task into `Completed`, the field changes,
    /// the `completed_at` stamp, and the +15/+10 credit commit in one unit
    /// of work. The decisive statement is conditional on the task not
    /// already being completed, so of two concurrent completion attempts
    /// exactly one awards; the loser falls back to a plain field update.
    ///
    /// Updates that don't enter `Completed` (including re-asserting it, or
    /// leaving it) never award and never touch `completed_at`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] - task missing or foreign
    /// - [`CoreError::Storage`] - database failure
    pub async fn update_task(
        &self,
        task_id: Uuid,
        user_id: Uuid,
        changes: UpdateTaskFields,
    ) -> CoreResult<Task> {
        let task = Task::find_by_id_and_owner(self.store.pool(), task_id, user_id)
            .await?
            .ok_or(CoreError::NotFound("Task"))?;

        if entering_completed(task.status, changes.status) {
            let mut uow = self.store.begin().await?;

            match Task::complete_with_fields(uow.conn(), task_id, user_id, &changes).await? {
                Some(updated) => {
                    let credited = User::apply_award(
                        uow.conn(),
                        user_id,
                        TASK_COMPLETION_POINTS,
                        TASK_COMPLETION_COINS,
                    )
                    .await?;
                    if !credited {
                        uow.rollback().await?;
                        return Err(CoreError::NotFound("User"));
                    }

                    uow.commit().await?;

                    info!(
                        user_id = %user_id,
                        task_id = %task_id,
                        points = TASK_COMPLETION_POINTS,
                        coins = TASK_COMPLETION_COINS,
                        "Task completion awarded"
                    );

                    return Ok(updated);
                }
                None => {
                    // A concurrent update completed the task first; apply
                    // the remaining changes without awarding.
                    uow.rollback().await?;
                    debug!(task_id = %task_id, "Lost completion race, applying plain update");
                }
            }
        }

        Task::update_fields(self.store.pool(), task_id, user_id, changes)
            .await?
            .ok_or(CoreError::NotFound("Task"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_award_constants() {
        assert_eq!(HABIT_COMPLETION_POINTS, 10);
        assert_eq!(HABIT_COMPLETION_COINS, 5);
        assert_eq!(TASK_COMPLETION_POINTS, 15);
        assert_eq!(TASK_COMPLETION_COINS, 10);
    }

    #[test]
    fn test_entering_completed_from_each_status() {
        for current in [
            TaskStatus::Pending,
            TaskStatus::InProgress,
            TaskStatus::Cancelled,
        ] {
            assert!(
                entering_completed(current, Some(TaskStatus::Completed)),
                "{current:?} -> Completed must award"
            );
        }
    }

    #[test]
    fn test_reasserting_completed_does_not_award() {
        assert!(!entering_completed(
            TaskStatus::Completed,
            Some(TaskStatus::Completed)
        ));
    }

    #[test]
    fn test_no_status_change_does_not_award() {
        assert!(!entering_completed(TaskStatus::Pending, None));
        assert!(!entering_completed(TaskStatus::Completed, None));
    }

    #[test]
    fn test_non_completing_transitions_do_not_award() {
        assert!(!entering_completed(
            TaskStatus::Pending,
            Some(TaskStatus::InProgress)
        ));
        assert!(!entering_completed(
            TaskStatus::Completed,
            Some(TaskStatus::Pending)
        ));
        assert!(!entering_completed(
            TaskStatus::InProgress,
            Some(TaskStatus::Cancelled)
        ));
    }

    #[test]
    fn test_recompletion_awards_again() {
        // Left Completed earlier; entering it again is a fresh transition.
        assert!(entering_completed(
            TaskStatus::Pending,
            Some(TaskStatus::Completed)
        ));
    }

    // Transactional behavior (atomicity, the concurrent completion race)
    // is exercised by the API integration tests against a live database.
}
