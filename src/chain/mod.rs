//! Read-only contract calls: token metadata, market underlying, gauge controller and escrow.
//!
//! Every call either returns a value or fails (reverted, transport, undecodable). Callers
//! substitute their documented defaults on failure; nothing here retries forever.

use crate::domain::{Address, RawAmount};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod abi;
pub mod mock;
pub mod rpc;

pub use mock::MockChainReader;
pub use rpc::RpcChainReader;

/// Synchronous-from-the-engine's-view contract reads.
#[async_trait]
pub trait ChainReader: Send + Sync + fmt::Debug {
    /// ERC-20 `symbol()`.
    async fn symbol(&self, token: &Address) -> Result<String, CallError>;

    /// ERC-20 `name()`.
    async fn name(&self, token: &Address) -> Result<String, CallError>;

    /// ERC-20 `decimals()`.
    async fn decimals(&self, token: &Address) -> Result<u32, CallError>;

    /// Market `underlying()`.
    async fn underlying(&self, market: &Address) -> Result<Address, CallError>;

    /// Gauge controller `voting_escrow()`.
    async fn voting_escrow(&self, controller: &Address) -> Result<Address, CallError>;

    /// Gauge controller `gauge_relative_weight(gauge)`, 1e18-scaled.
    async fn gauge_relative_weight(
        &self,
        controller: &Address,
        gauge: &Address,
    ) -> Result<RawAmount, CallError>;

    /// Voting escrow `get_last_user_slope(user)`.
    async fn last_user_slope(&self, escrow: &Address, user: &Address) -> Result<i128, CallError>;

    /// Voting escrow `locked__end(user)`, seconds.
    async fn locked_end(&self, escrow: &Address, user: &Address) -> Result<u64, CallError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("call reverted: {0}")]
    Reverted(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("undecodable return data for {0}")]
    Decode(&'static str),
}
