//! In-memory entity store for tests and dry runs.

use super::{Store, StoreError, StoredEntity};
use crate::domain::EntityKind;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryStore {
    entities: Mutex<BTreeMap<(&'static str, String), StoredEntity>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entities of a kind.
    pub fn count(&self, kind: EntityKind) -> usize {
        self.entities
            .lock()
            .map(|map| map.keys().filter(|(k, _)| *k == kind.as_str()).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Option<serde_json::Value>, StoreError> {
        let map = self.entities.lock().unwrap_or_else(|e| e.into_inner());
        Ok(map
            .get(&(kind.as_str(), id.to_string()))
            .map(|e| e.body.clone()))
    }

    async fn save(&self, entity: StoredEntity) -> Result<(), StoreError> {
        let mut map = self.entities.lock().unwrap_or_else(|e| e.into_inner());
        map.insert((entity.kind.as_str(), entity.id.clone()), entity);
        Ok(())
    }

    async fn save_batch(&self, entities: Vec<StoredEntity>) -> Result<(), StoreError> {
        let mut map = self.entities.lock().unwrap_or_else(|e| e.into_inner());
        for entity in entities {
            map.insert((entity.kind.as_str(), entity.id.clone()), entity);
        }
        Ok(())
    }

    async fn list(
        &self,
        kind: EntityKind,
        user: Option<&str>,
    ) -> Result<Vec<StoredEntity>, StoreError> {
        let map = self.entities.lock().unwrap_or_else(|e| e.into_inner());
        Ok(map
            .values()
            .filter(|e| e.kind == kind)
            .filter(|e| user.map_or(true, |u| e.user.as_deref() == Some(u)))
            .cloned()
            .collect())
    }
}
