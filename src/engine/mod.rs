//! Event projection engine.
//!
//! `Projector::apply` turns one decoded protocol event into idempotent, order-sensitive writes
//! against the entity directory. Handlers never fail for domain reasons: missing prerequisites
//! drop the event, failed chain reads fall back to defaults. Only store faults propagate.

use crate::chain::ChainReader;
use crate::datasource::InstanceRegistry;
use crate::domain::{Address, LogEvent, ProtocolEvent, Token, User};
use crate::store::{EntityDirectory, StoreError};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub mod accrual;
pub mod ledger;
pub mod registry;
pub mod sequence;
pub mod votes;

pub use sequence::take_ticket;
pub use votes::{round_to_next_week, vote_amount, WEEK};

/// Known deployment addresses that need special handling during market listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectorSettings {
    /// Market wrapping the chain's native currency; it has no `underlying()`.
    pub native_market: Address,
    /// Wrapped native asset; gets fixed metadata instead of a lookup.
    pub wrapped_native: Address,
}

/// Result of applying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// A prerequisite entity was missing; nothing was written.
    Dropped(DropReason),
    /// The event is a no-op by rule (e.g. mint/redeem transfer artifacts).
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    UnknownMarket(Address),
    UnknownUnderlying { market: Address, underlying: Address },
    UnknownCollateral(Address),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::UnknownMarket(m) => write!(f, "market {} is not registered", m),
            DropReason::UnknownUnderlying { market, underlying } => {
                write!(f, "underlying {} of market {} is not registered", underlying, market)
            }
            DropReason::UnknownCollateral(c) => {
                write!(f, "collateral market {} is not registered", c)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// A registered market and its registered underlying asset.
#[derive(Debug, Clone)]
pub(crate) struct MarketContext {
    pub address: Address,
    pub market: Token,
    pub underlying: Token,
}

pub struct Projector {
    directory: EntityDirectory,
    chain: Arc<dyn ChainReader>,
    registry: Arc<dyn InstanceRegistry>,
    settings: ProjectorSettings,
}

impl fmt::Debug for Projector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projector")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Projector {
    pub fn new(
        directory: EntityDirectory,
        chain: Arc<dyn ChainReader>,
        registry: Arc<dyn InstanceRegistry>,
        settings: ProjectorSettings,
    ) -> Self {
        Self {
            directory,
            chain,
            registry,
            settings,
        }
    }

    pub fn directory(&self) -> &EntityDirectory {
        &self.directory
    }

    /// Apply one event, persisting every effect before returning.
    pub async fn apply(&self, event: &LogEvent) -> Result<Outcome, ProjectionError> {
        let outcome = match &event.event {
            ProtocolEvent::MarketListed(p) => self.on_market_listed(event, p).await?,
            ProtocolEvent::MarketEntered(p) => self.on_market_membership(event, p, true).await?,
            ProtocolEvent::MarketExited(p) => self.on_market_membership(event, p, false).await?,
            ProtocolEvent::DistributedSupplierReward(p)
            | ProtocolEvent::DistributedBorrowerReward(p) => {
                self.on_distributed_reward(p).await?
            }
            ProtocolEvent::Mint(p) => self.on_mint(event, p).await?,
            ProtocolEvent::Redeem(p) => self.on_redeem(event, p).await?,
            ProtocolEvent::Borrow(p) => self.on_borrow(event, p).await?,
            ProtocolEvent::RepayBorrow(p) => self.on_repay_borrow(event, p).await?,
            ProtocolEvent::LiquidateBorrow(p) => self.on_liquidate_borrow(event, p).await?,
            ProtocolEvent::Transfer(p) => self.on_transfer(event, p).await?,
            ProtocolEvent::AccrueInterest(p) => self.on_accrue_interest(event, p).await?,
            ProtocolEvent::NewGauge(p) => self.on_new_gauge(p).await?,
            ProtocolEvent::VoteForGauge(p) => self.on_vote_for_gauge(event, p).await?,
        };

        if let Outcome::Dropped(reason) = &outcome {
            debug!(
                event = event.event.name(),
                position = %event.position(),
                tx = %event.tx_hash,
                reason = %reason,
                "Event dropped"
            );
        }
        Ok(outcome)
    }

    /// Resolve a market and its underlying, or the reason the event must be dropped.
    pub(crate) async fn resolve_market(
        &self,
        market: &Address,
    ) -> Result<Result<MarketContext, DropReason>, StoreError> {
        let Some(market_token) = self.directory.load::<Token>(market.as_str()).await? else {
            return Ok(Err(DropReason::UnknownMarket(market.clone())));
        };
        let Some(underlying) = self
            .directory
            .load::<Token>(market_token.underlying.as_str())
            .await?
        else {
            return Ok(Err(DropReason::UnknownUnderlying {
                market: market.clone(),
                underlying: market_token.underlying.clone(),
            }));
        };
        Ok(Ok(MarketContext {
            address: market.clone(),
            market: market_token,
            underlying,
        }))
    }

    pub(crate) async fn ensure_user(&self, account: &Address) -> Result<User, StoreError> {
        self.directory
            .get_or_create(account.as_str(), || User::new(account))
            .await
    }
}
