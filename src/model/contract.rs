use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::quote::OptionType;

/// A single option contract flagged by the unusual-activity filter.
///
/// Field names match the serialized wire format consumed by existing
/// clients; `implied_volatility` is in percent and `volume_ratio` is the
/// clamped volume/open-interest ratio, both rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnusualContract {
    pub underlying_ticker: String,
    pub option_symbol: String,
    pub option_type: OptionType,
    pub strike_price: f64,
    pub expiration_date: NaiveDate,
    /// Calendar days until expiration; negative once the expiry has passed.
    pub days_to_expiry: i64,
    pub current_volume: u64,
    pub open_interest: u64,
    pub implied_volatility: f64,
    pub volume_ratio: f64,
    pub in_the_money: bool,
    pub current_stock_price: Option<f64>,
    pub last_price: f64,
}
