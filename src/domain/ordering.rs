//! Canonical chain ordering for deterministic event processing.

use crate::domain::LogEvent;
use serde::{Deserialize, Serialize};

/// Position of a log in canonical chain order.
///
/// Ordering: block_number -> tx_index -> log_index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPosition {
    pub block_number: u64,
    pub tx_index: u64,
    pub log_index: u64,
}

impl std::fmt::Display for EventPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.block_number, self.tx_index, self.log_index)
    }
}

/// Sort events into canonical order. Stable for equal positions.
pub fn sort_events_canonical(events: &mut [LogEvent]) {
    events.sort_by_key(|e| e.position());
}
