//! Domain types and determinism layer for the lending/governance projection.
//!
//! This module provides:
//! - Lossless numeric handling via Decimal wrapper and token-precision normalization
//! - Raw on-chain integer amounts
//! - Domain primitives: Address, TxHash
//! - Decoded protocol events and their canonical ordering key
//! - Projected entities with deterministic keys

pub mod amount;
pub mod decimal;
pub mod entities;
pub mod events;
pub mod ordering;
pub mod primitives;

pub use amount::{RawAmount, SignedAmount};
pub use decimal::{to_decimal, Decimal};
pub use entities::{
    AccrueInterest, BalanceKind, BorrowRecord, Entity, EntityKind, EventLength, Gauge,
    HistoryKind, LiquidateRecord, MarketStatus, MintRecord, ProjectionCursor, RedeemRecord,
    RepayBorrowRecord, Token, TokenBalance, TokenInterest, TrackedMarket, TransferRecord, User,
    Vote, DEFAULT_DECIMALS,
};
pub use events::{
    AccrueInterestParams, BorrowParams, DistributedRewardParams, EventFamily,
    LiquidateBorrowParams, LogEvent, MarketListedParams, MarketMembershipParams, MintParams,
    NewGaugeParams, ProtocolEvent, RedeemParams, RepayBorrowParams, TransferParams,
    VoteForGaugeParams,
};
pub use ordering::{sort_events_canonical, EventPosition};
pub use primitives::{Address, AddressParseError, TxHash, ADDRESS_ZERO};
