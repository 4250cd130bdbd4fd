//! Market listing: token metadata resolution and market activation.

use super::{Outcome, Projector};
use crate::domain::{Address, LogEvent, MarketListedParams, Token, DEFAULT_DECIMALS};
use crate::store::StoreError;
use tracing::{info, warn};

const UNKNOWN_METADATA: &str = "unknown";

const WRAPPED_NATIVE_NAME: &str = "Wrapper ELA";
const WRAPPED_NATIVE_SYMBOL: &str = "WELA";

impl Projector {
    pub(crate) async fn on_market_listed(
        &self,
        event: &LogEvent,
        params: &MarketListedParams,
    ) -> Result<Outcome, StoreError> {
        let market = &params.c_token;
        let mut market_token = self
            .directory
            .get_or_create(market.as_str(), || Token::new(market))
            .await?;
        self.fill_metadata(&mut market_token, market).await;
        let underlying = self.resolve_underlying(market).await;
        market_token.underlying = underlying.clone();
        self.directory.save(&market_token).await?;

        if underlying.is_zero() {
            info!(
                market = %market,
                symbol = %market_token.symbol,
                "Market listed without underlying; not tracked"
            );
            return Ok(Outcome::Applied);
        }

        let mut underlying_token = self
            .directory
            .get_or_create(underlying.as_str(), || Token::new(&underlying))
            .await?;
        if underlying == self.settings.wrapped_native {
            underlying_token.name = WRAPPED_NATIVE_NAME.to_string();
            underlying_token.symbol = WRAPPED_NATIVE_SYMBOL.to_string();
            underlying_token.decimals = DEFAULT_DECIMALS;
        } else {
            self.fill_metadata(&mut underlying_token, &underlying).await;
        }
        underlying_token.underlying = Address::zero();
        self.directory.save(&underlying_token).await?;

        self.registry
            .register_instance(market, event.block_number)
            .await?;

        info!(
            market = %market,
            symbol = %market_token.symbol,
            underlying = %underlying,
            underlying_symbol = %underlying_token.symbol,
            "Market listed"
        );
        Ok(Outcome::Applied)
    }

    /// Populate name, symbol, and decimals from the chain, defaulting on failure.
    async fn fill_metadata(&self, token: &mut Token, address: &Address) {
        token.name = match self.chain.name(address).await {
            Ok(name) => name,
            Err(e) => {
                warn!(token = %address, error = %e, "name() failed, using default");
                UNKNOWN_METADATA.to_string()
            }
        };
        token.symbol = match self.chain.symbol(address).await {
            Ok(symbol) => symbol,
            Err(e) => {
                warn!(token = %address, error = %e, "symbol() failed, using default");
                UNKNOWN_METADATA.to_string()
            }
        };
        token.decimals = match self.chain.decimals(address).await {
            Ok(decimals) => decimals,
            Err(e) => {
                warn!(token = %address, error = %e, "decimals() failed, using default");
                DEFAULT_DECIMALS
            }
        };
    }

    /// The market's underlying asset, or the zero address for the native market and reverts.
    async fn resolve_underlying(&self, market: &Address) -> Address {
        if *market == self.settings.native_market {
            return Address::zero();
        }
        match self.chain.underlying(market).await {
            Ok(underlying) => underlying,
            Err(e) => {
                warn!(market = %market, error = %e, "underlying() failed, treating as root asset");
                Address::zero()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::chain::MockChainReader;
    use crate::datasource::{InstanceRegistry, StoreInstanceRegistry};
    use crate::domain::{
        Address, LogEvent, MarketListedParams, ProtocolEvent, Token, TxHash, DEFAULT_DECIMALS,
    };
    use crate::engine::{Outcome, Projector, ProjectorSettings};
    use crate::store::{EntityDirectory, MemoryStore};
    use std::sync::Arc;

    fn addr(last: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = last;
        Address::from_bytes(&bytes)
    }

    fn listing(market: &Address) -> LogEvent {
        LogEvent {
            address: addr(0xc0),
            block_number: 7,
            block_timestamp: 1_600_000_000,
            tx_hash: TxHash::new("0x01"),
            tx_index: 0,
            log_index: 0,
            event: ProtocolEvent::MarketListed(MarketListedParams {
                c_token: market.clone(),
            }),
        }
    }

    fn projector(chain: Arc<MockChainReader>) -> (Projector, Arc<StoreInstanceRegistry>) {
        let directory = EntityDirectory::new(Arc::new(MemoryStore::new()));
        let registry = Arc::new(StoreInstanceRegistry::new(directory.clone()));
        let projector = Projector::new(
            directory,
            chain,
            registry.clone(),
            ProjectorSettings {
                native_market: addr(0xee),
                wrapped_native: addr(0xef),
            },
        );
        (projector, registry)
    }

    #[tokio::test]
    async fn test_metadata_defaults_when_calls_revert() {
        let market = addr(1);
        let underlying = addr(2);
        let chain = MockChainReader::new().with_underlying(&market, &underlying);
        let (projector, registry) = projector(Arc::new(chain));

        let outcome = projector.apply(&listing(&market)).await.unwrap();
        assert_eq!(outcome, Outcome::Applied);

        let token: Token = projector
            .directory()
            .load(market.as_str())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(token.name, "unknown");
        assert_eq!(token.symbol, "unknown");
        assert_eq!(token.decimals, DEFAULT_DECIMALS);
        assert_eq!(token.underlying, underlying);
        assert!(registry.is_tracked(&market).await.unwrap());
    }

    #[tokio::test]
    async fn test_native_market_skips_underlying_call() {
        let native = addr(0xee);
        let chain = Arc::new(MockChainReader::new().with_token(&native, "Filda ELA", "fELA", 8));
        let (projector, registry) = projector(chain.clone());

        projector.apply(&listing(&native)).await.unwrap();

        let token: Token = projector
            .directory()
            .load(native.as_str())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(token.symbol, "fELA");
        assert!(token.underlying.is_zero());
        assert!(!registry.is_tracked(&native).await.unwrap());
        // name, symbol, decimals; no underlying()
        assert_eq!(chain.call_count(), 3);
    }

    #[tokio::test]
    async fn test_relisting_is_idempotent() {
        let market = addr(1);
        let underlying = addr(2);
        let chain = MockChainReader::new()
            .with_token(&market, "Filda USDC", "fUSDC", 8)
            .with_token(&underlying, "USD Coin", "USDC", 6)
            .with_underlying(&market, &underlying);
        let (projector, _) = projector(Arc::new(chain));

        projector.apply(&listing(&market)).await.unwrap();
        let first: Token = projector
            .directory()
            .load(underlying.as_str())
            .await
            .unwrap()
            .unwrap();
        projector.apply(&listing(&market)).await.unwrap();
        let second: Token = projector
            .directory()
            .load(underlying.as_str())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(second.decimals, 6);
        assert!(second.underlying.is_zero());
    }
}
