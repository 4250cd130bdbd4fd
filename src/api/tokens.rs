use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::{parse_address, AppState};
use crate::domain::{AccrueInterest, Token};
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokensResponse {
    pub tokens: Vec<TokenDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDto {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underlying: Option<String>,
}

impl From<Token> for TokenDto {
    fn from(token: Token) -> Self {
        let underlying = if token.underlying.is_zero() {
            None
        } else {
            Some(token.underlying.as_str().to_string())
        };
        TokenDto {
            address: token.id,
            name: token.name,
            symbol: token.symbol,
            decimals: token.decimals,
            underlying,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDetailResponse {
    #[serde(flatten)]
    pub token: TokenDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<AccrualDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccrualDto {
    pub cash_prior: String,
    pub interest_accumulated: String,
    pub borrow_index: String,
    pub total_borrows: String,
    pub timestamp: u64,
}

pub async fn list_tokens(State(state): State<AppState>) -> Result<Json<TokensResponse>, AppError> {
    let tokens = state.directory.list::<Token>(None).await?;
    Ok(Json(TokensResponse {
        tokens: tokens.into_iter().map(TokenDto::from).collect(),
    }))
}

pub async fn get_token(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<TokenDetailResponse>, AppError> {
    let address = parse_address(&address, "token")?;
    let token = state
        .directory
        .load::<Token>(address.as_str())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Token {} not found", address)))?;

    let accrual = state
        .directory
        .load::<AccrueInterest>(&AccrueInterest::key(&address))
        .await?
        .map(|a| AccrualDto {
            cash_prior: a.cash_prior.to_string(),
            interest_accumulated: a.interest_accumulated.to_string(),
            borrow_index: a.borrow_index.to_string(),
            total_borrows: a.total_borrows.to_string(),
            timestamp: a.timestamp,
        });

    Ok(Json(TokenDetailResponse {
        token: token.into(),
        accrual,
    }))
}
