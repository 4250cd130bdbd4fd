#![allow(dead_code)]

use lending_projector::datasource::StoreInstanceRegistry;
use lending_projector::domain::{
    Address, Decimal, LogEvent, MarketListedParams, ProtocolEvent, RawAmount, TxHash,
};
use lending_projector::engine::{Projector, ProjectorSettings};
use lending_projector::store::{EntityDirectory, MemoryStore};
use lending_projector::MockChainReader;
use std::str::FromStr;
use std::sync::Arc;

pub fn addr(last: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[19] = last;
    Address::from_bytes(&bytes)
}

pub fn comptroller() -> Address {
    addr(0xc0)
}

pub fn gauge_controller() -> Address {
    addr(0xd0)
}

pub fn native_market() -> Address {
    addr(0xee)
}

pub fn wrapped_native() -> Address {
    addr(0xef)
}

pub fn raw(value: &str) -> RawAmount {
    RawAmount::from_str(value).unwrap()
}

pub fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

pub fn settings() -> ProjectorSettings {
    ProjectorSettings {
        native_market: native_market(),
        wrapped_native: wrapped_native(),
    }
}

/// Build a log at `(block, 0, log_index)`.
pub fn log_event(
    emitter: &Address,
    block: u64,
    log_index: u64,
    tx: &str,
    event: ProtocolEvent,
) -> LogEvent {
    LogEvent {
        address: emitter.clone(),
        block_number: block,
        block_timestamp: 1_650_000_000 + block * 3,
        tx_hash: TxHash::new(tx),
        tx_index: 0,
        log_index,
        event,
    }
}

pub fn listing(market: &Address, block: u64) -> LogEvent {
    log_event(
        &comptroller(),
        block,
        0,
        "0x1157",
        ProtocolEvent::MarketListed(MarketListedParams {
            c_token: market.clone(),
        }),
    )
}

pub struct Harness {
    pub projector: Arc<Projector>,
    pub directory: EntityDirectory,
    pub registry: Arc<StoreInstanceRegistry>,
    pub chain: Arc<MockChainReader>,
}

pub fn harness(chain: MockChainReader) -> Harness {
    harness_with_directory(chain, EntityDirectory::new(Arc::new(MemoryStore::new())))
}

pub fn harness_with_directory(chain: MockChainReader, directory: EntityDirectory) -> Harness {
    let chain = Arc::new(chain);
    let registry = Arc::new(StoreInstanceRegistry::new(directory.clone()));
    let projector = Arc::new(Projector::new(
        directory.clone(),
        chain.clone(),
        registry.clone(),
        settings(),
    ));
    Harness {
        projector,
        directory,
        registry,
        chain,
    }
}

/// A chain with one 8-decimal market over a 6-decimal underlying, plus an 8-decimal
/// collateral market over an 18-decimal underlying.
pub fn lending_chain() -> MockChainReader {
    MockChainReader::new()
        .with_token(&addr(0xa1), "Filda USDC", "fUSDC", 8)
        .with_token(&addr(0xb1), "USD Coin", "USDC", 6)
        .with_underlying(&addr(0xa1), &addr(0xb1))
        .with_token(&addr(0xa2), "Filda ETH", "fETH", 8)
        .with_token(&addr(0xb2), "Ether", "ETH", 18)
        .with_underlying(&addr(0xa2), &addr(0xb2))
}
