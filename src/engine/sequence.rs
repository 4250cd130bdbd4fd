//! Per-kind history sequence numbers.

use crate::domain::{EventLength, HistoryKind, TxHash};
use crate::store::{EntityDirectory, StoreError};

/// Take the next ticket for `kind` and return the history key it yields.
///
/// Reads the shared counter, builds `{tx}_{Label}_{n}` from the current value, then persists
/// the incremented counter. Callers must write the history record before the next ticket is
/// taken for the same kind.
pub async fn take_ticket(
    directory: &EntityDirectory,
    kind: HistoryKind,
    tx_hash: &TxHash,
) -> Result<String, StoreError> {
    let mut counters = directory
        .get_or_create(EventLength::ID, EventLength::new)
        .await?;
    let key = kind.key(tx_hash, counters.current(kind));
    counters.advance(kind);
    directory.save(&counters).await?;
    Ok(key)
}
