use serde::{Deserialize, Serialize};

/// One row of an options chain at a single expiration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    pub strike: f64,
    pub volume: u64,
    pub open_interest: u64,
    /// Fractional implied volatility (0.35 = 35%).
    pub implied_volatility: f64,
    pub last_price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// Single-letter code used in synthesized option symbols.
    pub fn symbol_letter(&self) -> char {
        match self {
            OptionType::Call => 'C',
            OptionType::Put => 'P',
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionType::Call => "call",
            OptionType::Put => "put",
        }
    }
}
