use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::contract::UnusualContract;

// ── Request types ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct BreakdownQuery {
    /// "sentiment" (default) or "contracts".
    pub view: Option<String>,
}

// ── Response types ───────────────────────────────────────────────────

/// Per-ticker unusual-activity report served by `/ticker/{ticker}`.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityResponse {
    pub ticker: String,
    pub date: NaiveDate,
    pub current_price: Option<f64>,
    pub has_unusual_activity: bool,
    pub options_activity: Vec<UnusualContract>,
    pub calls_volume: u64,
    pub puts_volume: u64,
    pub calls_percentage: f64,
    pub puts_percentage: f64,
}

impl ActivityResponse {
    /// The all-zero shape served when nothing could be fetched.
    pub fn empty(ticker: &str, date: NaiveDate, current_price: Option<f64>) -> Self {
        ActivityResponse {
            ticker: ticker.to_string(),
            date,
            current_price,
            has_unusual_activity: false,
            options_activity: Vec::new(),
            calls_volume: 0,
            puts_volume: 0,
            calls_percentage: 0.0,
            puts_percentage: 0.0,
        }
    }
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub last_provider_request: Option<String>,
    pub seconds_since_last_request: Option<f64>,
    pub min_request_interval: f64,
    pub cached_tickers: usize,
    pub cached_options: usize,
    pub cached_scores: usize,
}
