//! Scripted chain reader for tests without an RPC node.

use super::{CallError, ChainReader};
use crate::domain::{Address, RawAmount};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
}

/// Mock reader answering from predefined tables; anything unknown reverts.
#[derive(Debug, Default)]
pub struct MockChainReader {
    tokens: HashMap<Address, TokenMetadata>,
    underlyings: HashMap<Address, Address>,
    escrows: HashMap<Address, Address>,
    relative_weights: HashMap<Address, RawAmount>,
    slopes: HashMap<Address, i128>,
    lock_ends: HashMap<Address, u64>,
    calls: AtomicUsize,
}

impl MockChainReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: &Address, name: &str, symbol: &str, decimals: u32) -> Self {
        self.tokens.insert(
            token.clone(),
            TokenMetadata {
                name: name.to_string(),
                symbol: symbol.to_string(),
                decimals,
            },
        );
        self
    }

    pub fn with_underlying(mut self, market: &Address, underlying: &Address) -> Self {
        self.underlyings.insert(market.clone(), underlying.clone());
        self
    }

    pub fn with_voting_escrow(mut self, controller: &Address, escrow: &Address) -> Self {
        self.escrows.insert(controller.clone(), escrow.clone());
        self
    }

    pub fn with_relative_weight(mut self, gauge: &Address, weight: RawAmount) -> Self {
        self.relative_weights.insert(gauge.clone(), weight);
        self
    }

    pub fn with_lock(mut self, user: &Address, slope: i128, lock_end: u64) -> Self {
        self.slopes.insert(user.clone(), slope);
        self.lock_ends.insert(user.clone(), lock_end);
        self
    }

    /// Total calls answered (including reverts).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn token(&self, token: &Address) -> Result<&TokenMetadata, CallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .get(token)
            .ok_or_else(|| CallError::Reverted(format!("no metadata for {}", token)))
    }
}

#[async_trait]
impl ChainReader for MockChainReader {
    async fn symbol(&self, token: &Address) -> Result<String, CallError> {
        self.token(token).map(|t| t.symbol.clone())
    }

    async fn name(&self, token: &Address) -> Result<String, CallError> {
        self.token(token).map(|t| t.name.clone())
    }

    async fn decimals(&self, token: &Address) -> Result<u32, CallError> {
        self.token(token).map(|t| t.decimals)
    }

    async fn underlying(&self, market: &Address) -> Result<Address, CallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.underlyings
            .get(market)
            .cloned()
            .ok_or_else(|| CallError::Reverted(format!("{} has no underlying()", market)))
    }

    async fn voting_escrow(&self, controller: &Address) -> Result<Address, CallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.escrows
            .get(controller)
            .cloned()
            .ok_or_else(|| CallError::Reverted(format!("{} has no voting_escrow()", controller)))
    }

    async fn gauge_relative_weight(
        &self,
        _controller: &Address,
        gauge: &Address,
    ) -> Result<RawAmount, CallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.relative_weights
            .get(gauge)
            .copied()
            .ok_or_else(|| CallError::Reverted(format!("unknown gauge {}", gauge)))
    }

    async fn last_user_slope(&self, _escrow: &Address, user: &Address) -> Result<i128, CallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.slopes
            .get(user)
            .copied()
            .ok_or_else(|| CallError::Reverted(format!("no lock for {}", user)))
    }

    async fn locked_end(&self, _escrow: &Address, user: &Address) -> Result<u64, CallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.lock_ends
            .get(user)
            .copied()
            .ok_or_else(|| CallError::Reverted(format!("no lock for {}", user)))
    }
}
