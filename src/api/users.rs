use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::{parse_address, AppState};
use crate::domain::{BalanceKind, MarketStatus, TokenBalance, TokenInterest, User};
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub address: String,
    pub reward_accrued: String,
    pub entered_markets: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancesResponse {
    pub user: String,
    pub balances: Vec<BalanceDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceDto {
    pub id: String,
    pub kind: &'static str,
    pub token: String,
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borrow_index: Option<String>,
}

pub async fn get_user(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    let address = parse_address(&address, "user")?;
    let user = state
        .directory
        .load::<User>(address.as_str())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", address)))?;

    let entered_markets = state
        .directory
        .list::<MarketStatus>(Some(address.as_str()))
        .await?
        .into_iter()
        .filter(|s| s.entered)
        .map(|s| s.market.as_str().to_string())
        .collect();

    Ok(Json(UserResponse {
        address: user.id,
        reward_accrued: user.reward_accrued.to_string(),
        entered_markets,
    }))
}

pub async fn get_balances(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<BalancesResponse>, AppError> {
    let address = parse_address(&address, "user")?;
    let balances = state
        .directory
        .list::<TokenBalance>(Some(address.as_str()))
        .await?;
    let interests = state
        .directory
        .list::<TokenInterest>(Some(address.as_str()))
        .await?;

    let mut dtos = Vec::with_capacity(balances.len());
    for balance in balances {
        // Loans are indexed against the market's latest accrual
        let borrow_index = match balance.kind {
            BalanceKind::Loan => interests
                .iter()
                .find(|i| i.market == balance.token)
                .map(|i| i.borrow_index.to_string()),
            BalanceKind::Deposit => None,
        };
        dtos.push(BalanceDto {
            id: balance.id,
            kind: balance.kind.as_str(),
            token: balance.token.as_str().to_string(),
            amount: balance.amount.to_canonical_string(),
            borrow_index,
        });
    }

    Ok(Json(BalancesResponse {
        user: address.as_str().to_string(),
        balances: dtos,
    }))
}
