//! Upstream event delivery and dynamic per-market tracking.

use crate::domain::{Address, EventPosition, LogEvent};
use crate::store::StoreError;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod jsonl;
pub mod mock;
pub mod tracking;

pub use jsonl::JsonlEventSource;
pub use mock::MockEventSource;
pub use tracking::StoreInstanceRegistry;

/// Source of decoded protocol events in canonical chain order.
///
/// Implementations deliver each event exactly once and exclude rolled-back history.
#[async_trait]
pub trait EventSource: Send + Sync + fmt::Debug {
    /// Fetch up to `limit` events strictly after `after` (from the start when `None`).
    ///
    /// # Returns
    /// Events ordered by (block_number, tx_index, log_index). An empty batch means the source
    /// is exhausted for now.
    async fn fetch_after(
        &self,
        after: Option<EventPosition>,
        limit: usize,
    ) -> Result<Vec<LogEvent>, DataSourceError>;
}

/// Registry of market contracts whose per-instance events are routed to the ledger.
#[async_trait]
pub trait InstanceRegistry: Send + Sync + fmt::Debug {
    /// Activate tracking for `address`. Registering an already tracked address is a no-op.
    async fn register_instance(&self, address: &Address, block_number: u64)
        -> Result<(), StoreError>;

    async fn is_tracked(&self, address: &Address) -> Result<bool, StoreError>;
}

#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },
    #[error("Duplicate event position {0}")]
    DuplicatePosition(EventPosition),
}
