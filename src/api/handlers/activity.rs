use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use tracing::error;

use crate::api::state::AppState;
use crate::api::types::ActivityResponse;
use crate::model::quote::OptionType;

/// `/ticker/{ticker}` — unusual contracts plus a calls/puts volume summary.
/// Degrades to the empty shape instead of erroring.
pub async fn ticker_activity(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Json<ActivityResponse> {
    let ticker = ticker.to_uppercase();
    let today = Utc::now().date_naive();

    let (snapshot, contracts) = match state.scanner.unusual(&ticker).await {
        Ok(Some((snapshot, contracts))) => (Some(snapshot), contracts),
        Ok(None) => (None, Vec::new()),
        Err(e) => {
            error!(%ticker, error = %format!("{e:#}"), "activity lookup failed");
            return Json(ActivityResponse::empty(&ticker, today, None));
        }
    };

    // Prefer the price the contracts were judged against, then the snapshot,
    // then a bare quote for tickers without chains.
    let current_price = match contracts.first() {
        Some(c) => c.current_stock_price,
        None => match snapshot.as_ref().and_then(|s| s.current_price) {
            Some(p) => Some(p),
            None => state.scanner.price(&ticker).await.ok().flatten(),
        },
    };

    let calls_volume: u64 = contracts
        .iter()
        .filter(|c| c.option_type == OptionType::Call)
        .map(|c| c.current_volume)
        .sum();
    let puts_volume: u64 = contracts
        .iter()
        .filter(|c| c.option_type == OptionType::Put)
        .map(|c| c.current_volume)
        .sum();
    let total_volume = calls_volume + puts_volume;

    let (calls_percentage, puts_percentage) = if total_volume > 0 {
        (
            calls_volume as f64 / total_volume as f64 * 100.0,
            puts_volume as f64 / total_volume as f64 * 100.0,
        )
    } else {
        (0.0, 0.0)
    };

    Json(ActivityResponse {
        ticker,
        date: today,
        current_price,
        has_unusual_activity: !contracts.is_empty(),
        options_activity: contracts,
        calls_volume,
        puts_volume,
        calls_percentage,
        puts_percentage,
    })
}
