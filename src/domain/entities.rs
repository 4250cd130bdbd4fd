//! Projected entities and their deterministic keys.
//!
//! Every entity is identified by a lowercase string id derived from the event that creates it.
//! Entities are persisted as JSON bodies keyed by `(kind, id)`; the optional `user` column lets
//! the read side list one account's records without scanning ids.

use crate::domain::{Address, Decimal, EventPosition, RawAmount, SignedAmount, TxHash};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Decimal count assumed when a token's `decimals()` cannot be read.
pub const DEFAULT_DECIMALS: u32 = 18;

/// Entity kinds, one table partition each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Token,
    User,
    MarketStatus,
    TokenBalance,
    TokenInterest,
    AccrueInterest,
    Mint,
    Redeem,
    Borrow,
    RepayBorrow,
    Liquidate,
    Transfer,
    EventLength,
    Gauge,
    Vote,
    TrackedMarket,
    ProjectionCursor,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Token => "token",
            EntityKind::User => "user",
            EntityKind::MarketStatus => "market_status",
            EntityKind::TokenBalance => "token_balance",
            EntityKind::TokenInterest => "token_interest",
            EntityKind::AccrueInterest => "accrue_interest",
            EntityKind::Mint => "mint",
            EntityKind::Redeem => "redeem",
            EntityKind::Borrow => "borrow",
            EntityKind::RepayBorrow => "repay_borrow",
            EntityKind::Liquidate => "liquidate",
            EntityKind::Transfer => "transfer",
            EntityKind::EventLength => "event_length",
            EntityKind::Gauge => "gauge",
            EntityKind::Vote => "vote",
            EntityKind::TrackedMarket => "tracked_market",
            EntityKind::ProjectionCursor => "projection_cursor",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A keyed record the projector reads and writes.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    /// Owning account, when the record belongs to one.
    fn user(&self) -> Option<&str> {
        None
    }
}

// =========================================================================
// Registry
// =========================================================================

/// A market token or an underlying asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    /// Zero address for root assets.
    pub underlying: Address,
}

impl Token {
    pub fn new(address: &Address) -> Self {
        Token {
            id: address.as_str().to_string(),
            name: String::new(),
            symbol: String::new(),
            decimals: DEFAULT_DECIMALS,
            underlying: Address::zero(),
        }
    }
}

impl Entity for Token {
    const KIND: EntityKind = EntityKind::Token;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    /// Cumulative governance reward delta.
    pub reward_accrued: SignedAmount,
}

impl User {
    pub fn new(address: &Address) -> Self {
        User {
            id: address.as_str().to_string(),
            reward_accrued: SignedAmount::ZERO,
        }
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> &str {
        &self.id
    }

    fn user(&self) -> Option<&str> {
        Some(&self.id)
    }
}

/// Whether an account has entered a market as collateral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStatus {
    pub id: String,
    pub market: Address,
    pub user: Address,
    pub entered: bool,
    pub timestamp: u64,
}

impl MarketStatus {
    pub fn key(market: &Address, user: &Address) -> String {
        format!("{}_{}", market, user)
    }

    pub fn new(market: &Address, user: &Address) -> Self {
        MarketStatus {
            id: Self::key(market, user),
            market: market.clone(),
            user: user.clone(),
            entered: false,
            timestamp: 0,
        }
    }
}

impl Entity for MarketStatus {
    const KIND: EntityKind = EntityKind::MarketStatus;

    fn id(&self) -> &str {
        &self.id
    }

    fn user(&self) -> Option<&str> {
        Some(self.user.as_str())
    }
}

// =========================================================================
// Balances and interest
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BalanceKind {
    /// Supplied market-token shares; accumulated from deltas.
    Deposit,
    /// Outstanding debt; overwritten with the protocol-reported figure.
    Loan,
}

impl BalanceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BalanceKind::Deposit => "Deposit",
            BalanceKind::Loan => "Loan",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub id: String,
    pub kind: BalanceKind,
    pub user: Address,
    /// Market token the position lives in.
    pub token: Address,
    pub amount: Decimal,
}

impl TokenBalance {
    /// `key_token` is the market for deposits and the market's underlying for loans.
    pub fn key(key_token: &Address, user: &Address, kind: BalanceKind) -> String {
        format!("{}_{}_{}", key_token, user, kind.as_str())
    }

    pub fn new(key_token: &Address, token: &Address, user: &Address, kind: BalanceKind) -> Self {
        TokenBalance {
            id: Self::key(key_token, user, kind),
            kind,
            user: user.clone(),
            token: token.clone(),
            amount: Decimal::zero(),
        }
    }
}

impl Entity for TokenBalance {
    const KIND: EntityKind = EntityKind::TokenBalance;

    fn id(&self) -> &str {
        &self.id
    }

    fn user(&self) -> Option<&str> {
        Some(self.user.as_str())
    }
}

/// The accrual snapshot a user's position was last indexed against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInterest {
    pub id: String,
    pub market: Address,
    pub user: Address,
    pub borrow_index: RawAmount,
    pub timestamp: u64,
}

impl TokenInterest {
    pub fn key(market: &Address, user: &Address) -> String {
        format!("{}_{}", market, user)
    }

    pub fn new(market: &Address, user: &Address) -> Self {
        TokenInterest {
            id: Self::key(market, user),
            market: market.clone(),
            user: user.clone(),
            borrow_index: RawAmount::ZERO,
            timestamp: 0,
        }
    }
}

impl Entity for TokenInterest {
    const KIND: EntityKind = EntityKind::TokenInterest;

    fn id(&self) -> &str {
        &self.id
    }

    fn user(&self) -> Option<&str> {
        Some(self.user.as_str())
    }
}

/// Latest accrual reported by a market; one per market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccrueInterest {
    pub id: String,
    pub market: Address,
    pub cash_prior: RawAmount,
    pub interest_accumulated: RawAmount,
    pub borrow_index: RawAmount,
    pub total_borrows: RawAmount,
    pub timestamp: u64,
}

impl AccrueInterest {
    pub fn key(market: &Address) -> String {
        format!("{}_AccrueInterest", market)
    }
}

impl Entity for AccrueInterest {
    const KIND: EntityKind = EntityKind::AccrueInterest;

    fn id(&self) -> &str {
        &self.id
    }
}

// =========================================================================
// History records
// =========================================================================

/// History record kinds sharing the EventLength counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryKind {
    Mint,
    Redeem,
    Borrow,
    Repay,
    Liquidate,
    Transfer,
}

impl HistoryKind {
    pub fn label(&self) -> &'static str {
        match self {
            HistoryKind::Mint => "Mint",
            HistoryKind::Redeem => "Redeem",
            HistoryKind::Borrow => "Borrow",
            HistoryKind::Repay => "Repay",
            HistoryKind::Liquidate => "Liquidate",
            HistoryKind::Transfer => "Transfer",
        }
    }

    /// `{tx_hash}_{Label}_{sequence}`
    pub fn key(&self, tx_hash: &TxHash, sequence: u64) -> String {
        format!("{}_{}_{}", tx_hash, self.label(), sequence)
    }
}

/// Process-wide per-kind sequence counters for history keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLength {
    pub id: String,
    pub mint: u64,
    pub redeem: u64,
    pub borrow: u64,
    pub repay: u64,
    pub liquidate: u64,
    pub transfer: u64,
}

impl EventLength {
    pub const ID: &'static str = "event length";

    pub fn new() -> Self {
        EventLength {
            id: Self::ID.to_string(),
            ..Default::default()
        }
    }

    pub fn current(&self, kind: HistoryKind) -> u64 {
        match kind {
            HistoryKind::Mint => self.mint,
            HistoryKind::Redeem => self.redeem,
            HistoryKind::Borrow => self.borrow,
            HistoryKind::Repay => self.repay,
            HistoryKind::Liquidate => self.liquidate,
            HistoryKind::Transfer => self.transfer,
        }
    }

    pub fn advance(&mut self, kind: HistoryKind) {
        let counter = match kind {
            HistoryKind::Mint => &mut self.mint,
            HistoryKind::Redeem => &mut self.redeem,
            HistoryKind::Borrow => &mut self.borrow,
            HistoryKind::Repay => &mut self.repay,
            HistoryKind::Liquidate => &mut self.liquidate,
            HistoryKind::Transfer => &mut self.transfer,
        };
        *counter += 1;
    }
}

impl Entity for EventLength {
    const KIND: EntityKind = EntityKind::EventLength;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintRecord {
    pub id: String,
    pub token: Address,
    pub minter: Address,
    /// Market-token shares minted.
    pub amount: Decimal,
    /// Underlying supplied.
    pub underlying_amount: Decimal,
    pub timestamp: u64,
    pub block_number: u64,
    pub tx_hash: TxHash,
}

impl Entity for MintRecord {
    const KIND: EntityKind = EntityKind::Mint;

    fn id(&self) -> &str {
        &self.id
    }

    fn user(&self) -> Option<&str> {
        Some(self.minter.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemRecord {
    pub id: String,
    pub token: Address,
    pub redeemer: Address,
    pub amount: Decimal,
    pub underlying_amount: Decimal,
    pub timestamp: u64,
    pub block_number: u64,
    pub tx_hash: TxHash,
}

impl Entity for RedeemRecord {
    const KIND: EntityKind = EntityKind::Redeem;

    fn id(&self) -> &str {
        &self.id
    }

    fn user(&self) -> Option<&str> {
        Some(self.redeemer.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRecord {
    pub id: String,
    pub token: Address,
    pub borrower: Address,
    pub borrow_amount: Decimal,
    pub account_borrows: Decimal,
    pub total_borrows: Decimal,
    pub timestamp: u64,
    pub block_number: u64,
    pub tx_hash: TxHash,
}

impl Entity for BorrowRecord {
    const KIND: EntityKind = EntityKind::Borrow;

    fn id(&self) -> &str {
        &self.id
    }

    fn user(&self) -> Option<&str> {
        Some(self.borrower.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepayBorrowRecord {
    pub id: String,
    pub token: Address,
    pub borrower: Address,
    pub payer: Address,
    pub repay_amount: Decimal,
    pub account_borrows: Decimal,
    pub total_borrows: Decimal,
    pub timestamp: u64,
    pub block_number: u64,
    pub tx_hash: TxHash,
}

impl Entity for RepayBorrowRecord {
    const KIND: EntityKind = EntityKind::RepayBorrow;

    fn id(&self) -> &str {
        &self.id
    }

    fn user(&self) -> Option<&str> {
        Some(self.borrower.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidateRecord {
    pub id: String,
    /// Debt market.
    pub token: Address,
    /// Collateral market.
    pub collateral: Address,
    pub liquidator: Address,
    pub borrower: Address,
    pub repay_amount: Decimal,
    pub seize: Decimal,
    pub timestamp: u64,
    pub block_number: u64,
    pub tx_hash: TxHash,
}

impl Entity for LiquidateRecord {
    const KIND: EntityKind = EntityKind::Liquidate;

    fn id(&self) -> &str {
        &self.id
    }

    fn user(&self) -> Option<&str> {
        Some(self.borrower.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    pub id: String,
    pub token: Address,
    pub from: Address,
    pub to: Address,
    pub amount: Decimal,
    pub timestamp: u64,
    pub block_number: u64,
    pub tx_hash: TxHash,
}

impl Entity for TransferRecord {
    const KIND: EntityKind = EntityKind::Transfer;

    fn id(&self) -> &str {
        &self.id
    }

    fn user(&self) -> Option<&str> {
        Some(self.from.as_str())
    }
}

// =========================================================================
// Governance
// =========================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gauge {
    pub id: String,
    /// Controller gauge type offset by one.
    pub gauge_type: i64,
}

impl Entity for Gauge {
    const KIND: EntityKind = EntityKind::Gauge;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: String,
    pub user: Address,
    pub gauge: Address,
    /// Basis points.
    pub weight: u64,
    /// Raw cast time.
    pub timestamp: u64,
    /// Cast time rounded up to the next week boundary.
    pub round_time: Option<u64>,
    /// Projected voting power; unset when the escrow could not be resolved.
    pub amount: Option<SignedAmount>,
}

impl Vote {
    /// `{user}_{gauge}_{time as 0x-hex}`
    pub fn key(user: &Address, gauge: &Address, time: u64) -> String {
        format!("{}_{}_{:#x}", user, gauge, time)
    }
}

impl Entity for Vote {
    const KIND: EntityKind = EntityKind::Vote;

    fn id(&self) -> &str {
        &self.id
    }

    fn user(&self) -> Option<&str> {
        Some(self.user.as_str())
    }
}

// =========================================================================
// Runtime bookkeeping
// =========================================================================

/// A market activated for per-instance event routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedMarket {
    pub id: String,
    pub registered_at_block: u64,
}

impl Entity for TrackedMarket {
    const KIND: EntityKind = EntityKind::TrackedMarket;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Watermark of the last fully applied event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionCursor {
    pub id: String,
    pub position: EventPosition,
    pub tx_hash: TxHash,
    /// Wall-clock update time in milliseconds.
    pub updated_at: i64,
}

impl ProjectionCursor {
    pub const ID: &'static str = "cursor";
}

impl Entity for ProjectionCursor {
    const KIND: EntityKind = EntityKind::ProjectionCursor;

    fn id(&self) -> &str {
        &self.id
    }
}
