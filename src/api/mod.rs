pub mod governance;
pub mod health;
pub mod tokens;
pub mod users;

use crate::chain::ChainReader;
use crate::domain::Address;
use crate::error::AppError;
use crate::store::EntityDirectory;
use axum::{routing::get, Router};
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub directory: EntityDirectory,
    pub chain: Arc<dyn ChainReader>,
    /// Controller queried for live gauge weights; `None` disables the lookup.
    pub gauge_controller: Option<Address>,
}

impl AppState {
    pub fn new(
        directory: EntityDirectory,
        chain: Arc<dyn ChainReader>,
        gauge_controller: Option<Address>,
    ) -> Self {
        Self {
            directory,
            chain,
            gauge_controller,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/tokens", get(tokens::list_tokens))
        .route("/v1/tokens/:address", get(tokens::get_token))
        .route("/v1/users/:address", get(users::get_user))
        .route("/v1/users/:address/balances", get(users::get_balances))
        .route("/v1/votes", get(governance::list_votes))
        .route("/v1/gauges", get(governance::list_gauges))
        .layer(cors)
        .with_state(state)
}

pub(crate) fn parse_address(raw: &str, what: &str) -> Result<Address, AppError> {
    Address::from_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid {} address", what)))
}
