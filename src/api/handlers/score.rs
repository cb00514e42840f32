use axum::Json;
use axum::extract::{Path, State};
use tracing::error;

use crate::api::state::AppState;
use crate::model::score::TickerScore;

/// `/unusualness-score/{ticker}` — always answers with a well-formed score
/// payload; fetch failures degrade to the zeroed shape with the error in the
/// interpretation text.
pub async fn unusualness_score(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Json<TickerScore> {
    let ticker = ticker.to_uppercase();

    match state.scanner.score(&ticker).await {
        Ok(Some(score)) => Json(score),
        Ok(None) => Json(TickerScore::unavailable(&ticker)),
        Err(e) => {
            error!(%ticker, error = %format!("{e:#}"), "scoring failed");
            let mut degraded = TickerScore::unavailable(&ticker);
            degraded.interpretation = vec![format!("Error analyzing options: {e:#}")];
            Json(degraded)
        }
    }
}
