//! Write buffer that turns one event's writes into a single store transaction.

use super::{Store, StoreError, StoredEntity};
use crate::domain::EntityKind;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::debug;

type Key = (&'static str, String);

/// Buffers saves in memory until `commit` hands them to the inner store in one batch.
///
/// Reads see buffered writes first, so handlers keep read-your-own-writes while nothing
/// reaches the inner store until the unit is complete.
pub struct StagedStore {
    inner: Arc<dyn Store>,
    pending: Mutex<BTreeMap<Key, StoredEntity>>,
}

impl StagedStore {
    pub fn new(inner: Arc<dyn Store>) -> Self {
        StagedStore {
            inner,
            pending: Mutex::new(BTreeMap::new()),
        }
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, BTreeMap<Key, StoredEntity>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for StagedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedStore")
            .field("inner", &self.inner)
            .field("pending", &self.pending().len())
            .finish()
    }
}

#[async_trait]
impl Store for StagedStore {
    async fn load(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Option<serde_json::Value>, StoreError> {
        let staged = self
            .pending()
            .get(&(kind.as_str(), id.to_string()))
            .map(|e| e.body.clone());
        match staged {
            Some(body) => Ok(Some(body)),
            None => self.inner.load(kind, id).await,
        }
    }

    async fn save(&self, entity: StoredEntity) -> Result<(), StoreError> {
        self.pending()
            .insert((entity.kind.as_str(), entity.id.clone()), entity);
        Ok(())
    }

    async fn list(
        &self,
        kind: EntityKind,
        user: Option<&str>,
    ) -> Result<Vec<StoredEntity>, StoreError> {
        let committed = self.inner.list(kind, user).await?;
        let mut merged: BTreeMap<String, StoredEntity> =
            committed.into_iter().map(|e| (e.id.clone(), e)).collect();

        let pending = self.pending();
        for entity in pending.values().filter(|e| e.kind == kind) {
            if user.map_or(true, |u| entity.user.as_deref() == Some(u)) {
                merged.insert(entity.id.clone(), entity.clone());
            } else {
                // Ownership moved away from the filtered account
                merged.remove(&entity.id);
            }
        }
        Ok(merged.into_values().collect())
    }

    async fn commit(&self) -> Result<(), StoreError> {
        let batch: Vec<StoredEntity> = std::mem::take(&mut *self.pending()).into_values().collect();
        if batch.is_empty() {
            return Ok(());
        }
        debug!(entities = batch.len(), "Committing staged writes");
        self.inner.save_batch(batch).await
    }

    async fn discard(&self) {
        let dropped = std::mem::take(&mut *self.pending()).len();
        if dropped > 0 {
            debug!(entities = dropped, "Discarded staged writes");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn stored(kind: EntityKind, id: &str, user: Option<&str>, n: i64) -> StoredEntity {
        StoredEntity {
            kind,
            id: id.to_string(),
            user: user.map(str::to_string),
            body: serde_json::json!({ "id": id, "n": n }),
        }
    }

    #[tokio::test]
    async fn test_writes_stay_staged_until_commit() {
        let inner = Arc::new(MemoryStore::new());
        let staged = StagedStore::new(inner.clone());

        staged
            .save(stored(EntityKind::Token, "0xaa", None, 1))
            .await
            .unwrap();
        assert!(staged.load(EntityKind::Token, "0xaa").await.unwrap().is_some());
        assert!(inner.load(EntityKind::Token, "0xaa").await.unwrap().is_none());

        staged.commit().await.unwrap();
        let body = inner.load(EntityKind::Token, "0xaa").await.unwrap();
        assert_eq!(body, Some(serde_json::json!({ "id": "0xaa", "n": 1 })));
    }

    #[tokio::test]
    async fn test_discard_restores_committed_state() {
        let inner = Arc::new(MemoryStore::new());
        let staged = StagedStore::new(inner.clone());
        staged
            .save(stored(EntityKind::Token, "0xaa", None, 1))
            .await
            .unwrap();
        staged.commit().await.unwrap();

        staged
            .save(stored(EntityKind::Token, "0xaa", None, 2))
            .await
            .unwrap();
        staged
            .save(stored(EntityKind::Token, "0xbb", None, 3))
            .await
            .unwrap();
        staged.discard().await;

        let all = staged.list(EntityKind::Token, None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].body["n"], 1);
        assert_eq!(inner.count(EntityKind::Token), 1);
    }

    #[tokio::test]
    async fn test_list_merges_staged_over_committed() {
        let inner = Arc::new(MemoryStore::new());
        let staged = StagedStore::new(inner.clone());
        staged
            .save(stored(EntityKind::Vote, "a", Some("0x01"), 1))
            .await
            .unwrap();
        staged
            .save(stored(EntityKind::Vote, "b", Some("0x01"), 2))
            .await
            .unwrap();
        staged.commit().await.unwrap();

        staged
            .save(stored(EntityKind::Vote, "b", Some("0x02"), 20))
            .await
            .unwrap();
        staged
            .save(stored(EntityKind::Vote, "c", Some("0x01"), 3))
            .await
            .unwrap();

        let first: Vec<String> = staged
            .list(EntityKind::Vote, Some("0x01"))
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(first, vec!["a", "c"]);

        let all = staged.list(EntityKind::Vote, None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[1].body["n"], 20);
    }
}
