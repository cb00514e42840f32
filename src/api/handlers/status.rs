use axum::Json;
use axum::extract::State;
use serde_json::json;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::api::types::StatusResponse;

pub async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "optscan: options unusual-activity API" }))
}

pub async fn api_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let pacing = state.scanner.pacing().await;
    let (cached_tickers, cached_options, cached_scores) = state.scanner.cache_counts().await;

    Json(StatusResponse {
        status: "operational",
        last_provider_request: pacing
            .last_request
            .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string()),
        seconds_since_last_request: pacing.seconds_since_last_request,
        min_request_interval: pacing.min_request_interval,
        cached_tickers,
        cached_options,
        cached_scores,
    })
}

pub async fn clear_cache(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.scanner.clear_cache().await?;
    Ok(Json(json!({ "message": "Cache cleared successfully" })))
}
