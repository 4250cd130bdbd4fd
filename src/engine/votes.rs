//! Gauge registration and decay-weighted vote power.

use super::{Outcome, Projector};
use crate::domain::{
    Address, Gauge, LogEvent, NewGaugeParams, SignedAmount, Vote, VoteForGaugeParams,
};
use crate::store::StoreError;
use tracing::{debug, warn};

/// One week in seconds; escrow checkpoints fall on multiples of it.
pub const WEEK: u64 = 604_800;

/// Vote weights are expressed in basis points.
const WEIGHT_DENOMINATOR: i128 = 10_000;

/// Round a timestamp up to the next week boundary; an exact boundary moves a full week.
pub fn round_to_next_week(time: u64) -> u64 {
    time.saturating_add(WEEK) / WEEK * WEEK
}

/// `slope * (lock_end - next_time) * weight / 10000`, truncating toward zero.
///
/// `None` on overflow. A lock ending before `next_time` yields a negative amount.
pub fn vote_amount(slope: i128, lock_end: u64, next_time: u64, weight: u64) -> Option<i128> {
    let remaining = i128::from(lock_end) - i128::from(next_time);
    slope
        .checked_mul(remaining)?
        .checked_mul(i128::from(weight))?
        .checked_div(WEIGHT_DENOMINATOR)
}

impl Projector {
    pub(crate) async fn on_new_gauge(&self, params: &NewGaugeParams) -> Result<Outcome, StoreError> {
        let gauge_type = params.gauge_type.saturating_add(1);
        let gauge = self
            .directory
            .get_or_create(params.addr.as_str(), || Gauge {
                id: params.addr.as_str().to_string(),
                gauge_type,
            })
            .await?;
        debug!(gauge = %gauge.id, gauge_type = gauge.gauge_type, "Gauge registered");
        Ok(Outcome::Applied)
    }

    pub(crate) async fn on_vote_for_gauge(
        &self,
        event: &LogEvent,
        params: &VoteForGaugeParams,
    ) -> Result<Outcome, StoreError> {
        self.ensure_user(&params.user).await?;

        let mut vote = Vote {
            id: Vote::key(&params.user, &params.gauge_addr, params.time),
            user: params.user.clone(),
            gauge: params.gauge_addr.clone(),
            weight: params.weight,
            timestamp: params.time,
            round_time: None,
            amount: None,
        };

        // The controller is the emitting contract
        let escrow = match self.chain.voting_escrow(&event.address).await {
            Ok(escrow) => escrow,
            Err(e) => {
                warn!(controller = %event.address, error = %e, "voting_escrow() failed");
                Address::zero()
            }
        };
        if escrow.is_zero() {
            debug!(vote = %vote.id, "Voting escrow unresolved, vote saved without amount");
            self.directory.save(&vote).await?;
            return Ok(Outcome::Applied);
        }

        let slope = self
            .chain
            .last_user_slope(&escrow, &params.user)
            .await
            .unwrap_or_else(|e| {
                warn!(user = %params.user, error = %e, "get_last_user_slope() failed, using 0");
                0
            });
        let lock_end = self
            .chain
            .locked_end(&escrow, &params.user)
            .await
            .unwrap_or_else(|e| {
                warn!(user = %params.user, error = %e, "locked__end() failed, using 0");
                0
            });

        let next_time = round_to_next_week(params.time);
        vote.round_time = Some(next_time);
        vote.amount = match vote_amount(slope, lock_end, next_time, params.weight) {
            Some(amount) => Some(SignedAmount(amount)),
            None => {
                warn!(
                    vote = %vote.id,
                    slope = %slope,
                    lock_end,
                    "Vote amount overflow, left unset"
                );
                None
            }
        };
        self.directory.save(&vote).await?;
        Ok(Outcome::Applied)
    }
}
