//! Portfolio-level bullish/bearish aggregation over per-ticker results.
//!
//! Two independent views share one output shape: the contract-count view
//! works off unusual contracts, the sentiment view off cached put/call-ratio
//! diagnostics. Both take caller-ordered slices and break ties by that
//! encounter order (stable sorts throughout).

use serde::{Deserialize, Serialize};

use crate::model::contract::UnusualContract;
use crate::model::quote::OptionType;

/// PCR above this reads as bearish positioning.
const PCR_BEARISH: f64 = 1.5;
/// PCR below this reads as bullish positioning.
const PCR_BULLISH: f64 = 0.7;
const TOP_N: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityBreakdown {
    pub total_unusual: usize,
    pub calls: usize,
    pub puts: usize,
    pub calls_percentage: f64,
    pub puts_percentage: f64,
    pub bullish_tickers: Vec<String>,
    pub bearish_tickers: Vec<String>,
}

/// Contract-count view: split all unusual contracts by type, with the top
/// tickers ranked by summed volume per side.
pub fn contract_view(contracts: &[UnusualContract]) -> ActivityBreakdown {
    let calls = contracts
        .iter()
        .filter(|c| c.option_type == OptionType::Call)
        .count();
    let puts = contracts.len() - calls;
    let total = contracts.len();

    let (calls_percentage, puts_percentage) = if total > 0 {
        (
            calls as f64 / total as f64 * 100.0,
            puts as f64 / total as f64 * 100.0,
        )
    } else {
        (0.0, 0.0)
    };

    ActivityBreakdown {
        total_unusual: total,
        calls,
        puts,
        calls_percentage,
        puts_percentage,
        bullish_tickers: top_by_volume(contracts, OptionType::Call),
        bearish_tickers: top_by_volume(contracts, OptionType::Put),
    }
}

/// Top tickers by summed contract volume of one type, first-encounter order
/// preserved for ties.
fn top_by_volume(contracts: &[UnusualContract], option_type: OptionType) -> Vec<String> {
    let mut volumes: Vec<(String, u64)> = Vec::new();
    for c in contracts.iter().filter(|c| c.option_type == option_type) {
        match volumes.iter_mut().find(|(t, _)| *t == c.underlying_ticker) {
            Some((_, v)) => *v += c.current_volume,
            None => volumes.push((c.underlying_ticker.clone(), c.current_volume)),
        }
    }

    volumes.sort_by(|a, b| b.1.cmp(&a.1));
    volumes.truncate(TOP_N);
    volumes.into_iter().map(|(t, _)| t).collect()
}

/// Sentiment view over `(ticker, pcr_near)` pairs from cached score results.
///
/// PCR above 1.5 weighs bearish (`-pcr`), below 0.7 bullish (`2 - pcr`),
/// the neutral band weighs zero and is excluded from the counts. When every
/// ticker is neutral the percentages report an even 50/50 split.
pub fn sentiment_view(tickers: &[(String, f64)]) -> ActivityBreakdown {
    if tickers.is_empty() {
        return ActivityBreakdown::default();
    }

    let weights: Vec<(&str, f64)> = tickers
        .iter()
        .map(|(ticker, pcr)| {
            let weight = if *pcr > PCR_BEARISH {
                -pcr
            } else if *pcr < PCR_BULLISH {
                2.0 - pcr
            } else {
                0.0
            };
            (ticker.as_str(), weight)
        })
        .collect();

    let mut bullish = weights.clone();
    bullish.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let bullish_tickers: Vec<String> = bullish
        .iter()
        .take(TOP_N)
        .filter(|(_, w)| *w > 0.0)
        .map(|(t, _)| t.to_string())
        .collect();

    let mut bearish = weights.clone();
    bearish.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    let bearish_tickers: Vec<String> = bearish
        .iter()
        .take(TOP_N)
        .filter(|(_, w)| *w < 0.0)
        .map(|(t, _)| t.to_string())
        .collect();

    let bull_count = weights.iter().filter(|(_, w)| *w > 0.0).count();
    let bear_count = weights.iter().filter(|(_, w)| *w < 0.0).count();
    let total = bull_count + bear_count;

    let (calls_percentage, puts_percentage) = if total > 0 {
        (
            bull_count as f64 / total as f64 * 100.0,
            bear_count as f64 / total as f64 * 100.0,
        )
    } else {
        (50.0, 50.0)
    };

    ActivityBreakdown {
        total_unusual: tickers.len(),
        calls: bull_count,
        puts: bear_count,
        calls_percentage,
        puts_percentage,
        bullish_tickers,
        bearish_tickers,
    }
}
