use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::quote::OptionQuote;

/// How far out (calendar days) the target expiration should sit.
pub const TARGET_WINDOW_DAYS: (i64, i64) = (20, 45);

/// Immutable per-ticker market snapshot: two option chains split into
/// calls/puts, the underlying price, and trailing daily closes.
///
/// `current_price` may be absent; every consumer tolerates that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub ticker: String,
    pub current_price: Option<f64>,
    pub calls_near: Vec<OptionQuote>,
    pub puts_near: Vec<OptionQuote>,
    pub calls_target: Vec<OptionQuote>,
    pub puts_target: Vec<OptionQuote>,
    /// Daily close prices, most recent last.
    pub historical_closes: Vec<f64>,
    pub nearest_expiration: NaiveDate,
    pub target_expiration: NaiveDate,
}

/// Pick the "~30 days out" expiration from a sorted list of expiration dates:
/// the first one 20–45 calendar days from `today`, falling back to the
/// second-nearest, falling back to the nearest if only one exists.
pub fn select_target_expiration(dates: &[NaiveDate], today: NaiveDate) -> Option<NaiveDate> {
    if dates.is_empty() {
        return None;
    }

    for date in dates {
        let days_out = (*date - today).num_days();
        if (TARGET_WINDOW_DAYS.0..=TARGET_WINDOW_DAYS.1).contains(&days_out) {
            return Some(*date);
        }
    }

    dates.get(1).or_else(|| dates.first()).copied()
}

/// Calendar days from `today` to `expiry`. Negative when the expiry has
/// already passed; callers keep the sign.
pub fn days_to_expiry(expiry: NaiveDate, today: NaiveDate) -> i64 {
    (expiry - today).num_days()
}
