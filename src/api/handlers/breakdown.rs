use axum::Json;
use axum::extract::{Query, State};

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::api::types::BreakdownQuery;
use crate::engine::aggregate::ActivityBreakdown;
use crate::scan::BreakdownView;

/// `/bullish-bearish` — portfolio-level breakdown over cached results.
/// `?view=contracts` switches from the default sentiment view.
pub async fn bullish_bearish(
    State(state): State<AppState>,
    Query(query): Query<BreakdownQuery>,
) -> Result<Json<ActivityBreakdown>, ApiError> {
    let view = match query.view.as_deref() {
        None | Some("sentiment") => BreakdownView::Sentiment,
        Some("contracts") => BreakdownView::Contracts,
        Some(other) => {
            return Err(ApiError::BadRequest(format!(
                "unknown view '{other}'; expected 'sentiment' or 'contracts'"
            )));
        }
    };

    Ok(Json(state.scanner.breakdown(view).await))
}
