//! The reward exchange.
//!
//! Users spend coins on catalog rewards. A redemption is one unit of work:
//! the [`UserReward`] record is inserted and the coins are debited with a
//! balance-guarded conditional update. If the guard fails (the balance
//! dropped below the cost since the caller looked), the whole transaction
//! aborts and no redemption record survives.
//!
//! # Example
//!
//! ```no_run
//! use questline_shared::db::store::Store;
//! use questline_shared::exchange::Exchange;
//! # use uuid::Uuid;
//!
//! # async fn example(store: Store, reward_id: Uuid, user_id: Uuid)
//! #     -> Result<(), questline_shared::error::CoreError> {
//! let exchange = Exchange::new(store);
//! let redemption = exchange.redeem(reward_id, user_id).await?;
//! println!("redeemed at {}", redemption.redeemed_at);
//! # Ok(())
//! # }
//! ```

use tracing::info;
use uuid::Uuid;

use crate::db::store::Store;
use crate::error::{CoreError, CoreResult};
use crate::models::reward::{Reward, UserReward};
use crate::models::user::User;

/// Error message for a redemption the balance can't cover.
pub const INSUFFICIENT_BALANCE: &str = "insufficient balance";

/// Redeems catalog rewards against user coin balances.
///
/// Constructed once at startup with the process's [`Store`] handle.
#[derive(Debug, Clone)]
pub struct Exchange {
    store: Store,
}

impl Exchange {
    pub fn new(store: Store) -> Self {
        Exchange { store }
    }

    /// The active catalog, cheapest first.
    pub async fn list_rewards(&self) -> CoreResult<Vec<Reward>> {
        let rewards = Reward::list_active(self.store.pool()).await?;
        Ok(rewards)
    }

    /// Redeems a reward, debiting the user's coins.
    ///
    /// The reward must exist and be active; otherwise `NotFound`. The
    /// redemption record and the debit commit together. The debit statement
    /// carries its own `coins >= cost` guard, so two concurrent redemptions
    /// against a balance that covers only one serialize on the user row:
    /// exactly one commits, the other rolls back with `Validation` and
    /// leaves no record behind. The balance can never go negative.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] - reward missing or inactive
    /// - [`CoreError::Validation`] - balance below the reward's cost
    /// - [`CoreError::Storage`] - database failure
    pub async fn redeem(&self, reward_id: Uuid, user_id: Uuid) -> CoreResult<UserReward> {
        let reward = Reward::find_active_by_id(self.store.pool(), reward_id)
            .await?
            .ok_or(CoreError::NotFound("Reward"))?;

        let mut uow = self.store.begin().await?;

        let redemption = UserReward::create(uow.conn(), user_id, reward_id).await?;

        let debited = User::debit_coins(uow.conn(), user_id, reward.cost).await?;
        if !debited {
            uow.rollback().await?;
            return Err(CoreError::Validation(INSUFFICIENT_BALANCE.to_string()));
        }

        uow.commit().await?;

        info!(
            user_id = %user_id,
            reward_id = %reward_id,
            cost = reward.cost,
            "Reward redeemed"
        );

        Ok(redemption)
    }
}
