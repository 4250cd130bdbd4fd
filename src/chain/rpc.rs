//! JSON-RPC `eth_call` client.

use super::abi;
use super::{CallError, ChainReader};
use crate::domain::{Address, RawAmount};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Chain reader against a node's HTTP JSON-RPC endpoint, reading at `latest`.
#[derive(Debug)]
pub struct RpcChainReader {
    client: Client,
    url: String,
    max_elapsed: Duration,
    next_id: AtomicU64,
}

impl RpcChainReader {
    pub fn new(url: String) -> Self {
        Self {
            client: Client::new(),
            url,
            max_elapsed: Duration::from_secs(30),
            next_id: AtomicU64::new(1),
        }
    }

    /// Cap on total retry time for transient transport failures.
    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = max_elapsed;
        self
    }

    async fn eth_call(&self, to: &Address, data: String) -> Result<Vec<u8>, CallError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "eth_call",
            "params": [{ "to": to.as_str(), "data": data }, "latest"]
        });
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.max_elapsed),
            ..Default::default()
        };

        let body = retry(backoff, || async {
            let response = self
                .client
                .post(&self.url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(CallError::Transport(e.to_string())))?;

            let status = response.status();
            if status == 429 || status.is_server_error() {
                return Err(backoff::Error::transient(CallError::Transport(format!(
                    "HTTP {}",
                    status.as_u16()
                ))));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(CallError::Transport(format!(
                    "HTTP {}",
                    status.as_u16()
                ))));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(CallError::Transport(e.to_string())))
        })
        .await?;

        parse_call_response(&body)
    }
}

/// Split a JSON-RPC response into return data or a revert.
fn parse_call_response(body: &serde_json::Value) -> Result<Vec<u8>, CallError> {
    if let Some(error) = body.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown error")
            .to_string();
        return Err(CallError::Reverted(message));
    }

    let result = body
        .get("result")
        .and_then(|r| r.as_str())
        .ok_or(CallError::Decode("eth_call result"))?;
    let data = abi::decode_hex(result).ok_or(CallError::Decode("eth_call result"))?;
    // An empty return is what a call to a non-contract or a missing function looks like
    if data.is_empty() {
        return Err(CallError::Reverted("empty return data".to_string()));
    }
    Ok(data)
}

/// ERC-20 `decimals()` is a `uint8`.
fn decode_decimals(data: &[u8]) -> Result<u32, CallError> {
    abi::decode_uint8(data)
        .map(u32::from)
        .ok_or(CallError::Decode("decimals"))
}

#[async_trait]
impl ChainReader for RpcChainReader {
    async fn symbol(&self, token: &Address) -> Result<String, CallError> {
        debug!(token = %token, "symbol()");
        let data = self.eth_call(token, abi::encode_call(abi::SYMBOL, &[])).await?;
        abi::decode_string(&data).ok_or(CallError::Decode("symbol"))
    }

    async fn name(&self, token: &Address) -> Result<String, CallError> {
        debug!(token = %token, "name()");
        let data = self.eth_call(token, abi::encode_call(abi::NAME, &[])).await?;
        abi::decode_string(&data).ok_or(CallError::Decode("name"))
    }

    async fn decimals(&self, token: &Address) -> Result<u32, CallError> {
        debug!(token = %token, "decimals()");
        let data = self
            .eth_call(token, abi::encode_call(abi::DECIMALS, &[]))
            .await?;
        decode_decimals(&data)
    }

    async fn underlying(&self, market: &Address) -> Result<Address, CallError> {
        debug!(market = %market, "underlying()");
        let data = self
            .eth_call(market, abi::encode_call(abi::UNDERLYING, &[]))
            .await?;
        abi::decode_address(&data).ok_or(CallError::Decode("underlying"))
    }

    async fn voting_escrow(&self, controller: &Address) -> Result<Address, CallError> {
        let data = self
            .eth_call(controller, abi::encode_call(abi::VOTING_ESCROW, &[]))
            .await?;
        abi::decode_address(&data).ok_or(CallError::Decode("voting_escrow"))
    }

    async fn gauge_relative_weight(
        &self,
        controller: &Address,
        gauge: &Address,
    ) -> Result<RawAmount, CallError> {
        let data = self
            .eth_call(
                controller,
                abi::encode_call(abi::GAUGE_RELATIVE_WEIGHT, &[gauge]),
            )
            .await?;
        abi::decode_uint(&data).ok_or(CallError::Decode("gauge_relative_weight"))
    }

    async fn last_user_slope(&self, escrow: &Address, user: &Address) -> Result<i128, CallError> {
        let data = self
            .eth_call(escrow, abi::encode_call(abi::GET_LAST_USER_SLOPE, &[user]))
            .await?;
        abi::decode_int128(&data).ok_or(CallError::Decode("get_last_user_slope"))
    }

    async fn locked_end(&self, escrow: &Address, user: &Address) -> Result<u64, CallError> {
        let data = self
            .eth_call(escrow, abi::encode_call(abi::LOCKED_END, &[user]))
            .await?;
        abi::decode_uint(&data)
            .and_then(|v| v.to_u128())
            .and_then(|v| u64::try_from(v).ok())
            .ok_or(CallError::Decode("locked__end"))
    }
}
