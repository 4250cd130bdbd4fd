use crate::api::AppState;
use crate::domain::ProjectionCursor;
use crate::error::AppError;
use axum::extract::State;
use axum::Json;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Ready once the store answers; reports the projection watermark.
pub async fn ready(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let cursor = state
        .directory
        .load::<ProjectionCursor>(ProjectionCursor::ID)
        .await?;

    Ok(Json(match cursor {
        Some(c) => serde_json::json!({
            "status": "ready",
            "cursor": c.position.to_string(),
            "blockNumber": c.position.block_number,
            "txHash": c.tx_hash.as_str(),
        }),
        None => serde_json::json!({"status": "ready", "cursor": null}),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_returns_ok() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
    }
}
