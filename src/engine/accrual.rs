//! Interest-index propagation and reward accumulation.

use super::{Outcome, Projector};
use crate::domain::{
    AccrueInterest, Address, DistributedRewardParams, SignedAmount, TokenInterest, User,
};
use crate::store::StoreError;
use tracing::warn;

impl Projector {
    /// Copy the market's latest accrual snapshot onto the user's interest record.
    ///
    /// No-op until the market has reported at least one accrual.
    pub async fn link_interest(&self, market: &Address, user: &Address) -> Result<(), StoreError> {
        let Some(snapshot) = self
            .directory
            .load::<AccrueInterest>(&AccrueInterest::key(market))
            .await?
        else {
            return Ok(());
        };

        let mut interest = self
            .directory
            .get_or_create(&TokenInterest::key(market, user), || {
                TokenInterest::new(market, user)
            })
            .await?;
        interest.borrow_index = snapshot.borrow_index;
        interest.timestamp = snapshot.timestamp;
        self.directory.save(&interest).await
    }

    /// Add `delta` to the user's cumulative reward.
    pub async fn accumulate_reward(
        &self,
        user: &Address,
        delta: SignedAmount,
    ) -> Result<User, StoreError> {
        let mut account = self.ensure_user(user).await?;
        match account.reward_accrued.checked_add(delta) {
            Some(total) => account.reward_accrued = total,
            None => {
                warn!(user = %user, delta = %delta, "Reward accumulator overflow, delta skipped");
                return Ok(account);
            }
        }
        self.directory.save(&account).await?;
        Ok(account)
    }

    pub(crate) async fn on_distributed_reward(
        &self,
        params: &DistributedRewardParams,
    ) -> Result<Outcome, StoreError> {
        let delta = match params.delta.to_u128().and_then(|v| i128::try_from(v).ok()) {
            Some(v) => SignedAmount(v),
            None => {
                warn!(
                    user = %params.account,
                    delta = %params.delta,
                    "Reward delta exceeds accumulator range, skipped"
                );
                return Ok(Outcome::Ignored);
            }
        };
        self.accumulate_reward(&params.account, delta).await?;
        Ok(Outcome::Applied)
    }
}
