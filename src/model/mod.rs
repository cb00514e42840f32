pub mod contract;
pub mod quote;
pub mod score;
pub mod snapshot;

pub use contract::UnusualContract;
pub use quote::{OptionQuote, OptionType};
pub use score::{ComponentScores, RawDiagnostics, ScoreResult, TickerScore};
pub use snapshot::MarketSnapshot;
