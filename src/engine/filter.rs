//! The unusual-contract filter: near-expiration quotes whose single-day
//! volume dwarfs existing open interest.

use chrono::NaiveDate;

use crate::model::contract::UnusualContract;
use crate::model::quote::{OptionQuote, OptionType};
use crate::model::snapshot::{self, MarketSnapshot};

use super::score::round2;

/// Quotes must trade more than this many contracts to be considered.
const MIN_VOLUME: u64 = 10;
/// Open interest at or below this yields a zero ratio instead of a huge one.
const MIN_OPEN_INTEREST: u64 = 10;
/// Clamped vol/OI ratio at or above this qualifies a quote as unusual.
const RATIO_THRESHOLD: f64 = 2.0;

/// Scan the nearest-expiration chains for unusual contracts, sorted by
/// vol/OI ratio descending. Ties keep encounter order: calls before puts,
/// original chain order within each side.
pub fn unusual_contracts(snapshot: &MarketSnapshot, today: NaiveDate) -> Vec<UnusualContract> {
    let mut contracts = Vec::new();

    for (quotes, option_type) in [
        (&snapshot.calls_near, OptionType::Call),
        (&snapshot.puts_near, OptionType::Put),
    ] {
        for quote in quotes.iter() {
            if let Some(c) = qualify(snapshot, quote, option_type, today) {
                contracts.push(c);
            }
        }
    }

    contracts.sort_by(|a, b| {
        b.volume_ratio
            .partial_cmp(&a.volume_ratio)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    contracts
}

fn qualify(
    snapshot: &MarketSnapshot,
    quote: &OptionQuote,
    option_type: OptionType,
    today: NaiveDate,
) -> Option<UnusualContract> {
    if quote.volume <= MIN_VOLUME || quote.open_interest == 0 {
        return None;
    }

    let ratio = if quote.open_interest > MIN_OPEN_INTEREST {
        (quote.volume as f64 / quote.open_interest as f64).min(20.0)
    } else {
        0.0
    };
    if ratio < RATIO_THRESHOLD {
        return None;
    }

    let in_the_money = match (option_type, snapshot.current_price) {
        (OptionType::Call, Some(price)) => quote.strike < price,
        (OptionType::Put, Some(price)) => quote.strike > price,
        (_, None) => false,
    };

    Some(UnusualContract {
        underlying_ticker: snapshot.ticker.clone(),
        option_symbol: format!(
            "{}{}{}",
            snapshot.ticker,
            option_type.symbol_letter(),
            (quote.strike * 100.0) as i64
        ),
        option_type,
        strike_price: quote.strike,
        expiration_date: snapshot.nearest_expiration,
        days_to_expiry: snapshot::days_to_expiry(snapshot.nearest_expiration, today),
        current_volume: quote.volume,
        open_interest: quote.open_interest,
        implied_volatility: round2(quote.implied_volatility * 100.0),
        volume_ratio: round2(ratio),
        in_the_money,
        current_stock_price: snapshot.current_price,
        last_price: round2(quote.last_price),
    })
}
