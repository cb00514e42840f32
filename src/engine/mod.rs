pub mod aggregate;
pub mod filter;
pub mod interpret;
pub mod score;

pub use aggregate::{ActivityBreakdown, contract_view, sentiment_view};
pub use filter::unusual_contracts;
pub use interpret::interpret;
pub use score::score_snapshot;
