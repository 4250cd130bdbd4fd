use crate::domain::Address;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Native-currency market of the production deployment.
pub const DEFAULT_NATIVE_MARKET: &str = "0xf31ad464e61118c735e6d3c909e7a42daa1575a3";
/// Wrapped native asset of the production deployment.
pub const DEFAULT_WRAPPED_NATIVE: &str = "0x517e9e5d46c1ea8ab6f78677d6114ef47f71f6c4";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub rpc_url: String,
    pub events_path: String,
    pub comptroller_address: Option<Address>,
    pub gauge_controller_address: Option<Address>,
    pub native_market_address: Address,
    pub wrapped_native_address: Address,
    pub batch_size: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = required(&env_map, "DATABASE_PATH")?;
        let rpc_url = required(&env_map, "RPC_URL")?;
        let events_path = required(&env_map, "EVENTS_PATH")?;

        let comptroller_address = optional_address(&env_map, "COMPTROLLER_ADDRESS")?;
        let gauge_controller_address = optional_address(&env_map, "GAUGE_CONTROLLER_ADDRESS")?;
        let native_market_address =
            optional_address(&env_map, "NATIVE_MARKET_ADDRESS")?.map_or_else(
                || parse_address("NATIVE_MARKET_ADDRESS", DEFAULT_NATIVE_MARKET),
                Ok,
            )?;
        let wrapped_native_address =
            optional_address(&env_map, "WRAPPED_NATIVE_ADDRESS")?.map_or_else(
                || parse_address("WRAPPED_NATIVE_ADDRESS", DEFAULT_WRAPPED_NATIVE),
                Ok,
            )?;

        let batch_size = env_map
            .get("BATCH_SIZE")
            .map(|s| s.as_str())
            .unwrap_or("500")
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "BATCH_SIZE".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;

        Ok(Config {
            port,
            database_path,
            rpc_url,
            events_path,
            comptroller_address,
            gauge_controller_address,
            native_market_address,
            wrapped_native_address,
            batch_size,
        })
    }
}

fn required(env_map: &HashMap<String, String>, key: &str) -> Result<String, ConfigError> {
    env_map
        .get(key)
        .filter(|v| !v.trim().is_empty())
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnv(key.to_string()))
}

fn optional_address(
    env_map: &HashMap<String, String>,
    key: &str,
) -> Result<Option<Address>, ConfigError> {
    match env_map.get(key).map(|s| s.trim()).filter(|s| !s.is_empty()) {
        Some(raw) => parse_address(key, raw).map(Some),
        None => Ok(None),
    }
}

fn parse_address(key: &str, raw: &str) -> Result<Address, ConfigError> {
    Address::from_str(raw).map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}
