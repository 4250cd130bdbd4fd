//! Keyed entity store abstraction and the typed entity directory on top of it.
//!
//! The store itself only knows `(kind, id) -> JSON body`. `EntityDirectory` adds typed access
//! and the single get-or-create entry point every handler goes through.

use crate::domain::{Entity, EntityKind};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub mod memory;
pub mod staged;

pub use memory::MemoryStore;
pub use staged::StagedStore;

/// A serialized entity ready for persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntity {
    pub kind: EntityKind,
    pub id: String,
    pub user: Option<String>,
    pub body: serde_json::Value,
}

/// Persistent keyed entity store.
///
/// Writes are visible to the next read on the same store (read-your-own-writes). There is no
/// delete: projected state only grows or is overwritten.
#[async_trait]
pub trait Store: Send + Sync + fmt::Debug {
    /// Load an entity body by kind and id.
    async fn load(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Option<serde_json::Value>, StoreError>;

    /// Insert or overwrite an entity.
    async fn save(&self, entity: StoredEntity) -> Result<(), StoreError>;

    /// Insert or overwrite several entities; backends with transactions write all or none.
    async fn save_batch(&self, entities: Vec<StoredEntity>) -> Result<(), StoreError> {
        for entity in entities {
            self.save(entity).await?;
        }
        Ok(())
    }

    /// List entities of a kind, optionally restricted to one owning account, ordered by id.
    async fn list(
        &self,
        kind: EntityKind,
        user: Option<&str>,
    ) -> Result<Vec<StoredEntity>, StoreError>;

    /// Make staged writes durable. Stores that write through have nothing to do.
    async fn commit(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Forget staged writes.
    async fn discard(&self) {}
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to (de)serialize {kind} {id}: {source}")]
    Codec {
        kind: EntityKind,
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Typed access to projected entities.
#[derive(Debug, Clone)]
pub struct EntityDirectory {
    store: Arc<dyn Store>,
}

impl EntityDirectory {
    pub fn new(store: Arc<dyn Store>) -> Self {
        EntityDirectory { store }
    }

    /// Load an entity by id.
    ///
    /// # Errors
    /// Returns an error if the store fails or the stored body does not decode.
    pub async fn load<E: Entity>(&self, id: &str) -> Result<Option<E>, StoreError> {
        match self.store.load(E::KIND, id).await? {
            Some(body) => serde_json::from_value(body)
                .map(Some)
                .map_err(|source| StoreError::Codec {
                    kind: E::KIND,
                    id: id.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Insert or overwrite an entity.
    pub async fn save<E: Entity>(&self, entity: &E) -> Result<(), StoreError> {
        let body = serde_json::to_value(entity).map_err(|source| StoreError::Codec {
            kind: E::KIND,
            id: entity.id().to_string(),
            source,
        })?;
        self.store
            .save(StoredEntity {
                kind: E::KIND,
                id: entity.id().to_string(),
                user: entity.user().map(str::to_string),
                body,
            })
            .await
    }

    /// Load an entity, or build it from `default` and persist it immediately.
    pub async fn get_or_create<E, F>(&self, id: &str, default: F) -> Result<E, StoreError>
    where
        E: Entity,
        F: FnOnce() -> E,
    {
        if let Some(existing) = self.load::<E>(id).await? {
            return Ok(existing);
        }
        let created = default();
        self.save(&created).await?;
        Ok(created)
    }

    /// List entities of a kind, optionally for one account.
    pub async fn list<E: Entity>(&self, user: Option<&str>) -> Result<Vec<E>, StoreError> {
        let stored = self.store.list(E::KIND, user).await?;
        stored
            .into_iter()
            .map(|entity| {
                serde_json::from_value(entity.body).map_err(|source| StoreError::Codec {
                    kind: E::KIND,
                    id: entity.id,
                    source,
                })
            })
            .collect()
    }

    /// Persist every write made since the last commit as one unit.
    pub async fn commit(&self) -> Result<(), StoreError> {
        self.store.commit().await
    }

    /// Drop writes made since the last commit.
    pub async fn discard(&self) {
        self.store.discard().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Address, BalanceKind, Decimal, Token, TokenBalance};
    use std::str::FromStr;

    fn directory() -> EntityDirectory {
        EntityDirectory::new(Arc::new(MemoryStore::new()))
    }

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let dir = directory();
        let market = addr("0x00000000000000000000000000000000000000a1");

        let first: Token = dir
            .get_or_create(market.as_str(), || Token::new(&market))
            .await
            .unwrap();
        let second: Token = dir
            .get_or_create(market.as_str(), || {
                let mut other = Token::new(&market);
                other.symbol = "SHOULD-NOT-APPEAR".to_string();
                other
            })
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(second.symbol, "");
    }

    #[tokio::test]
    async fn test_get_or_create_persists_immediately() {
        let dir = directory();
        let market = addr("0x00000000000000000000000000000000000000a1");

        let _: Token = dir
            .get_or_create(market.as_str(), || Token::new(&market))
            .await
            .unwrap();
        let loaded = dir.load::<Token>(market.as_str()).await.unwrap();
        assert!(loaded.is_some());
    }

    #[tokio::test]
    async fn test_save_overwrites_and_list_filters_by_user() {
        let dir = directory();
        let market = addr("0x00000000000000000000000000000000000000a1");
        let alice = addr("0x00000000000000000000000000000000000000b1");
        let bob = addr("0x00000000000000000000000000000000000000b2");

        let mut balance = TokenBalance::new(&market, &market, &alice, BalanceKind::Deposit);
        dir.save(&balance).await.unwrap();
        balance.amount = Decimal::from_str("5").unwrap();
        dir.save(&balance).await.unwrap();
        dir.save(&TokenBalance::new(&market, &market, &bob, BalanceKind::Deposit))
            .await
            .unwrap();

        let alice_balances = dir
            .list::<TokenBalance>(Some(alice.as_str()))
            .await
            .unwrap();
        assert_eq!(alice_balances.len(), 1);
        assert_eq!(alice_balances[0].amount, Decimal::from_str("5").unwrap());

        let all = dir.list::<TokenBalance>(None).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
