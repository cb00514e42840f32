use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Why a sub-score used its documented default instead of the computed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// Fewer than 20 historical closes.
    InsufficientHistory,
    /// No near-expiration quotes within ±5% of the underlying price.
    NoAtmQuotes,
    /// One of the out-of-the-money sides of the near chain is empty.
    EmptyOtmSide,
    /// The snapshot carries no underlying price.
    MissingPrice,
    /// An intermediate value came out NaN or infinite.
    NonFinite,
}

/// Result of one sub-score: either computed from the snapshot or a
/// documented default. Either way the value is finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubScore {
    Computed(f64),
    Fallback { value: f64, reason: FallbackReason },
}

impl SubScore {
    pub fn value(&self) -> f64 {
        match self {
            SubScore::Computed(v) => *v,
            SubScore::Fallback { value, .. } => *value,
        }
    }

    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self {
            SubScore::Computed(_) => None,
            SubScore::Fallback { reason, .. } => Some(*reason),
        }
    }
}

/// The four component scores, rounded to 2 decimals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub volume_oi_ratio: f64,
    pub put_call_ratio: f64,
    pub iv_vs_historical: f64,
    pub skew_analysis: f64,
}

/// Raw diagnostic values behind the component scores, rounded to 2 decimals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDiagnostics {
    pub avg_vol_oi: f64,
    pub pcr_near: f64,
    pub pcr_target: f64,
}

/// A sub-score that resolved to its fallback default, kept on the result so
/// tests and logs can see which paths degraded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackNote {
    pub component: String,
    pub reason: FallbackReason,
}

/// Output of the scoring engine. `score` is always an integer in 1..=10,
/// components are finite and non-negative, whatever the input looked like.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: u8,
    pub components: ComponentScores,
    pub raw_data: RawDiagnostics,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<FallbackNote>,
}

impl ScoreResult {
    /// The fixed result used when the whole pipeline degrades: all-zero
    /// components with the floor score.
    pub fn degraded() -> Self {
        ScoreResult {
            score: 1,
            components: ComponentScores::default(),
            raw_data: RawDiagnostics::default(),
            fallbacks: Vec::new(),
        }
    }
}

/// A scored ticker as cached and served: the engine result plus the
/// interpretation and snapshot context. `score` is 0 only in the synthetic
/// "no options data" response, which is never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerScore {
    pub ticker: String,
    pub current_price: Option<f64>,
    pub score: u8,
    pub interpretation: Vec<String>,
    pub components: ComponentScores,
    pub raw_data: RawDiagnostics,
    pub nearest_expiry: Option<NaiveDate>,
    pub target_expiry: Option<NaiveDate>,
}

impl TickerScore {
    /// The response shape for a ticker with no options data at all.
    pub fn unavailable(ticker: &str) -> Self {
        TickerScore {
            ticker: ticker.to_string(),
            current_price: None,
            score: 0,
            interpretation: vec!["No options data available for this ticker.".to_string()],
            components: ComponentScores::default(),
            raw_data: RawDiagnostics::default(),
            nearest_expiry: None,
            target_expiry: None,
        }
    }
}
