//! Market tracking persisted as `TrackedMarket` entities.

use super::InstanceRegistry;
use crate::domain::{Address, TrackedMarket};
use crate::store::{EntityDirectory, StoreError};
use async_trait::async_trait;
use tracing::info;

#[derive(Debug, Clone)]
pub struct StoreInstanceRegistry {
    directory: EntityDirectory,
}

impl StoreInstanceRegistry {
    pub fn new(directory: EntityDirectory) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl InstanceRegistry for StoreInstanceRegistry {
    async fn register_instance(
        &self,
        address: &Address,
        block_number: u64,
    ) -> Result<(), StoreError> {
        if self
            .directory
            .load::<TrackedMarket>(address.as_str())
            .await?
            .is_some()
        {
            return Ok(());
        }
        self.directory
            .save(&TrackedMarket {
                id: address.as_str().to_string(),
                registered_at_block: block_number,
            })
            .await?;
        info!(market = %address, block = block_number, "Market tracking activated");
        Ok(())
    }

    async fn is_tracked(&self, address: &Address) -> Result<bool, StoreError> {
        Ok(self
            .directory
            .load::<TrackedMarket>(address.as_str())
            .await?
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_registration_is_idempotent() {
        let directory = EntityDirectory::new(Arc::new(MemoryStore::new()));
        let registry = StoreInstanceRegistry::new(directory.clone());
        let market = Address::parse("0x00000000000000000000000000000000000000a1").unwrap();

        assert!(!registry.is_tracked(&market).await.unwrap());
        registry.register_instance(&market, 10).await.unwrap();
        registry.register_instance(&market, 20).await.unwrap();
        assert!(registry.is_tracked(&market).await.unwrap());

        let tracked = directory
            .load::<TrackedMarket>(market.as_str())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tracked.registered_at_block, 10);
    }
}
