//! Decoded protocol events as delivered by the upstream log source.

use crate::domain::{Address, EventPosition, RawAmount, TxHash};
use serde::{Deserialize, Serialize};

/// One decoded log together with its chain coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    /// Emitting contract.
    pub address: Address,
    pub block_number: u64,
    /// Block timestamp in seconds.
    pub block_timestamp: u64,
    pub tx_hash: TxHash,
    #[serde(default)]
    pub tx_index: u64,
    pub log_index: u64,
    pub event: ProtocolEvent,
}

impl LogEvent {
    pub fn position(&self) -> EventPosition {
        EventPosition {
            block_number: self.block_number,
            tx_index: self.tx_index,
            log_index: self.log_index,
        }
    }
}

/// Which contract family emits an event; drives routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFamily {
    Comptroller,
    Market,
    GaugeController,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "params")]
pub enum ProtocolEvent {
    MarketListed(MarketListedParams),
    MarketEntered(MarketMembershipParams),
    MarketExited(MarketMembershipParams),
    DistributedSupplierReward(DistributedRewardParams),
    DistributedBorrowerReward(DistributedRewardParams),
    Mint(MintParams),
    Redeem(RedeemParams),
    Borrow(BorrowParams),
    RepayBorrow(RepayBorrowParams),
    LiquidateBorrow(LiquidateBorrowParams),
    Transfer(TransferParams),
    AccrueInterest(AccrueInterestParams),
    NewGauge(NewGaugeParams),
    VoteForGauge(VoteForGaugeParams),
}

impl ProtocolEvent {
    pub fn family(&self) -> EventFamily {
        match self {
            ProtocolEvent::MarketListed(_)
            | ProtocolEvent::MarketEntered(_)
            | ProtocolEvent::MarketExited(_)
            | ProtocolEvent::DistributedSupplierReward(_)
            | ProtocolEvent::DistributedBorrowerReward(_) => EventFamily::Comptroller,
            ProtocolEvent::Mint(_)
            | ProtocolEvent::Redeem(_)
            | ProtocolEvent::Borrow(_)
            | ProtocolEvent::RepayBorrow(_)
            | ProtocolEvent::LiquidateBorrow(_)
            | ProtocolEvent::Transfer(_)
            | ProtocolEvent::AccrueInterest(_) => EventFamily::Market,
            ProtocolEvent::NewGauge(_) | ProtocolEvent::VoteForGauge(_) => {
                EventFamily::GaugeController
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProtocolEvent::MarketListed(_) => "MarketListed",
            ProtocolEvent::MarketEntered(_) => "MarketEntered",
            ProtocolEvent::MarketExited(_) => "MarketExited",
            ProtocolEvent::DistributedSupplierReward(_) => "DistributedSupplierReward",
            ProtocolEvent::DistributedBorrowerReward(_) => "DistributedBorrowerReward",
            ProtocolEvent::Mint(_) => "Mint",
            ProtocolEvent::Redeem(_) => "Redeem",
            ProtocolEvent::Borrow(_) => "Borrow",
            ProtocolEvent::RepayBorrow(_) => "RepayBorrow",
            ProtocolEvent::LiquidateBorrow(_) => "LiquidateBorrow",
            ProtocolEvent::Transfer(_) => "Transfer",
            ProtocolEvent::AccrueInterest(_) => "AccrueInterest",
            ProtocolEvent::NewGauge(_) => "NewGauge",
            ProtocolEvent::VoteForGauge(_) => "VoteForGauge",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketListedParams {
    pub c_token: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketMembershipParams {
    pub c_token: Address,
    pub account: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributedRewardParams {
    pub c_token: Address,
    pub account: Address,
    pub delta: RawAmount,
    #[serde(default)]
    pub index: RawAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintParams {
    pub minter: Address,
    pub mint_amount: RawAmount,
    pub mint_tokens: RawAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemParams {
    pub redeemer: Address,
    pub redeem_amount: RawAmount,
    pub redeem_tokens: RawAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowParams {
    pub borrower: Address,
    pub borrow_amount: RawAmount,
    pub account_borrows: RawAmount,
    pub total_borrows: RawAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepayBorrowParams {
    pub payer: Address,
    pub borrower: Address,
    pub repay_amount: RawAmount,
    pub account_borrows: RawAmount,
    pub total_borrows: RawAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidateBorrowParams {
    pub liquidator: Address,
    pub borrower: Address,
    pub repay_amount: RawAmount,
    pub c_token_collateral: Address,
    pub seize_tokens: RawAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferParams {
    pub from: Address,
    pub to: Address,
    pub amount: RawAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccrueInterestParams {
    pub cash_prior: RawAmount,
    pub interest_accumulated: RawAmount,
    pub borrow_index: RawAmount,
    pub total_borrows: RawAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGaugeParams {
    pub addr: Address,
    pub gauge_type: i64,
    #[serde(default)]
    pub weight: RawAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteForGaugeParams {
    /// Cast time in seconds.
    pub time: u64,
    pub user: Address,
    pub gauge_addr: Address,
    /// Basis points of the voter's power allocated to the gauge.
    pub weight: u64,
}
