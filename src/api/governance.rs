use axum::extract::{Query, State};
use axum::Json;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::{parse_address, AppState};
use crate::domain::{to_decimal, Address, Gauge, Vote};
use crate::error::AppError;

/// Controller weights are fractions scaled by 1e18.
const RELATIVE_WEIGHT_DECIMALS: u32 = 18;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotesQuery {
    pub user: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VotesResponse {
    pub votes: Vec<VoteDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteDto {
    pub id: String,
    pub user: String,
    pub gauge: String,
    pub weight: u64,
    pub timestamp: u64,
    pub round_time: Option<u64>,
    pub amount: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugesResponse {
    pub gauges: Vec<GaugeDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugeDto {
    pub address: String,
    pub gauge_type: i64,
    /// `None` when no controller is configured or the call failed.
    pub relative_weight: Option<String>,
}

pub async fn list_votes(
    Query(params): Query<VotesQuery>,
    State(state): State<AppState>,
) -> Result<Json<VotesResponse>, AppError> {
    let user = match params.user.as_deref() {
        Some(raw) => Some(parse_address(raw, "user")?),
        None => None,
    };

    let votes = state
        .directory
        .list::<Vote>(user.as_ref().map(Address::as_str))
        .await?;

    Ok(Json(VotesResponse {
        votes: votes
            .into_iter()
            .map(|v| VoteDto {
                id: v.id,
                user: v.user.as_str().to_string(),
                gauge: v.gauge.as_str().to_string(),
                weight: v.weight,
                timestamp: v.timestamp,
                round_time: v.round_time,
                amount: v.amount.map(|a| a.to_string()),
            })
            .collect(),
    }))
}

pub async fn list_gauges(State(state): State<AppState>) -> Result<Json<GaugesResponse>, AppError> {
    let gauges = state.directory.list::<Gauge>(None).await?;

    let weight_futures = gauges.iter().map(|gauge| {
        let state = state.clone();
        let id = gauge.id.clone();
        async move {
            let controller = state.gauge_controller.as_ref()?;
            let gauge_addr = Address::parse(&id).ok()?;
            match state
                .chain
                .gauge_relative_weight(controller, &gauge_addr)
                .await
            {
                Ok(raw) => Some(to_decimal(raw, RELATIVE_WEIGHT_DECIMALS).to_canonical_string()),
                Err(e) => {
                    warn!(gauge = %gauge_addr, error = %e, "gauge_relative_weight() failed");
                    None
                }
            }
        }
    });
    let weights = join_all(weight_futures).await;

    Ok(Json(GaugesResponse {
        gauges: gauges
            .into_iter()
            .zip(weights)
            .map(|(gauge, relative_weight)| GaugeDto {
                address: gauge.id,
                gauge_type: gauge.gauge_type,
                relative_weight,
            })
            .collect(),
    }))
}
