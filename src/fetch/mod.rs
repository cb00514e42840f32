pub mod provider;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use tokio::sync::Mutex;
use tracing::debug;

use crate::model::snapshot::MarketSnapshot;

pub use provider::ProviderClient;

/// Errors from the market-data provider boundary. Callers translate these
/// into empty/zeroed responses; nothing here is fatal.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned malformed data: {0}")]
    Malformed(String),
}

/// Snapshot of the provider request pacing, for the status endpoint.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PacingStatus {
    pub last_request: Option<DateTime<Utc>>,
    pub seconds_since_last_request: Option<f64>,
    pub min_request_interval: f64,
}

/// Where market snapshots come from. The HTTP layer, scheduler and tests all
/// talk to this seam; `ProviderClient` is the real implementation.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Build a snapshot for `ticker`. `Ok(None)` means the provider has no
    /// options data for it, which is a normal outcome rather than an error.
    async fn fetch_snapshot(&self, ticker: &str) -> Result<Option<MarketSnapshot>, FetchError>;

    /// Current underlying price only, for tickers without usable chains.
    async fn fetch_price(&self, ticker: &str) -> Result<Option<f64>, FetchError>;

    async fn pacing(&self) -> PacingStatus {
        PacingStatus {
            last_request: None,
            seconds_since_last_request: None,
            min_request_interval: 0.0,
        }
    }
}

/// Retry an async operation with exponential backoff and jitter.
pub async fn retry<T, F, Fut>(max_retries: u32, f: F) -> Result<T, FetchError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, FetchError>>,
{
    let mut last_err = None;
    for attempt in 0..=max_retries {
        match f().await {
            Ok(val) => return Ok(val),
            Err(e) => {
                debug!(attempt, error = %e, "provider request failed");
                last_err = Some(e);
                if attempt < max_retries {
                    let jitter = rand::rng().random_range(0..500);
                    let delay = Duration::from_millis(1000 * 2u64.pow(attempt) + jitter);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
    Err(last_err.unwrap())
}

/// Enforces a minimum interval between provider requests, with jitter so
/// bursts don't land on exact multiples of the interval.
pub struct Pacer {
    min_interval: Duration,
    last: Mutex<Option<(Instant, DateTime<Utc>)>>,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Pacer {
            min_interval,
            last: Mutex::new(None),
        }
    }

    /// Wait until the next request is allowed, then record it.
    pub async fn acquire(&self) {
        let mut last = self.last.lock().await;
        if let Some((at, _)) = *last {
            let elapsed = at.elapsed();
            if elapsed < self.min_interval {
                let jitter = Duration::from_millis(rand::rng().random_range(100..1000));
                let wait = self.min_interval - elapsed + jitter;
                debug!(wait_ms = wait.as_millis() as u64, "pacing provider request");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some((Instant::now(), Utc::now()));
    }

    pub async fn status(&self) -> PacingStatus {
        let last = self.last.lock().await;
        PacingStatus {
            last_request: last.map(|(_, at)| at),
            seconds_since_last_request: last.map(|(at, _)| at.elapsed().as_secs_f64()),
            min_request_interval: self.min_interval.as_secs_f64(),
        }
    }
}
