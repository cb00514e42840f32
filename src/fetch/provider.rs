//! REST market-data provider client. Endpoint shapes follow the upstream
//! JSON API: an expiration index, per-expiration chains split into
//! calls/puts, a quote endpoint, and daily close history.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use crate::model::quote::OptionQuote;
use crate::model::snapshot::{self, MarketSnapshot};

use super::{FetchError, Pacer, PacingStatus, SnapshotSource, retry};

const DEFAULT_BASE_URL: &str = "https://api.marketdata.com/v1";
/// Trading days of history requested for the realized-volatility leg.
const HISTORY_DAYS: u32 = 60;
const MIN_REQUEST_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RETRIES: u32 = 3;

// ── API response types ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ExpirationsResponse {
    expirations: Vec<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct ChainResponse {
    #[serde(default)]
    calls: Vec<WireQuote>,
    #[serde(default)]
    puts: Vec<WireQuote>,
}

/// Quote row as the provider serializes it; optional fields default to zero.
#[derive(Debug, Deserialize)]
struct WireQuote {
    strike: f64,
    #[serde(default)]
    volume: Option<u64>,
    #[serde(rename = "openInterest", default)]
    open_interest: Option<u64>,
    #[serde(rename = "impliedVolatility", default)]
    implied_volatility: Option<f64>,
    #[serde(rename = "lastPrice", default)]
    last_price: Option<f64>,
}

impl From<WireQuote> for OptionQuote {
    fn from(w: WireQuote) -> Self {
        OptionQuote {
            strike: w.strike,
            volume: w.volume.unwrap_or(0),
            open_interest: w.open_interest.unwrap_or(0),
            implied_volatility: w.implied_volatility.unwrap_or(0.0),
            last_price: w.last_price.unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(rename = "regularMarketPrice")]
    price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    results: Vec<HistoryBar>,
}

#[derive(Debug, Deserialize)]
struct HistoryBar {
    close: f64,
}

// ── Client ───────────────────────────────────────────────────────────

pub struct ProviderClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    pacer: Pacer,
}

impl ProviderClient {
    /// Build a client from `OPTSCAN_BASE_URL` / `OPTSCAN_API_KEY`.
    pub fn from_env() -> Result<Self, FetchError> {
        let base_url =
            std::env::var("OPTSCAN_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let api_key = std::env::var("OPTSCAN_API_KEY").unwrap_or_default();
        if api_key.is_empty() {
            warn!("OPTSCAN_API_KEY not set — provider requests will be unauthenticated");
        }
        Self::new(base_url, api_key)
    }

    pub fn new(base_url: String, api_key: String) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("optscan/0.1")
            .build()?;

        Ok(ProviderClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            pacer: Pacer::new(MIN_REQUEST_INTERVAL),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        retry(MAX_RETRIES, || {
            let http = self.http.clone();
            let url = url.to_string();
            let api_key = self.api_key.clone();
            async move {
                let r = http
                    .get(&url)
                    .query(&[("apiKey", api_key.as_str())])
                    .send()
                    .await?
                    .error_for_status()?
                    .json::<T>()
                    .await?;
                Ok(r)
            }
        })
        .await
    }

    async fn expirations(&self, ticker: &str) -> Result<Vec<NaiveDate>, FetchError> {
        self.pacer.acquire().await;
        let url = format!("{}/options/{}/expirations", self.base_url, ticker);
        let resp: ExpirationsResponse = self.get_json(&url).await?;
        let mut dates = resp.expirations;
        dates.sort();
        Ok(dates)
    }

    async fn chain(
        &self,
        ticker: &str,
        expiration: NaiveDate,
    ) -> Result<(Vec<OptionQuote>, Vec<OptionQuote>), FetchError> {
        self.pacer.acquire().await;
        let url = format!(
            "{}/options/{}/chain?expiration={}",
            self.base_url, ticker, expiration
        );
        let resp: ChainResponse = self.get_json(&url).await?;
        Ok((
            resp.calls.into_iter().map(OptionQuote::from).collect(),
            resp.puts.into_iter().map(OptionQuote::from).collect(),
        ))
    }

    async fn quote(&self, ticker: &str) -> Result<Option<f64>, FetchError> {
        self.pacer.acquire().await;
        let url = format!("{}/stocks/{}/quote", self.base_url, ticker);
        let resp: QuoteResponse = self.get_json(&url).await?;
        Ok(resp.price.filter(|p| p.is_finite() && *p > 0.0))
    }

    async fn history(&self, ticker: &str) -> Result<Vec<f64>, FetchError> {
        self.pacer.acquire().await;
        let url = format!(
            "{}/stocks/{}/history?days={}",
            self.base_url, ticker, HISTORY_DAYS
        );
        let resp: HistoryResponse = self.get_json(&url).await?;
        Ok(resp.results.into_iter().map(|b| b.close).collect())
    }
}

#[async_trait]
impl SnapshotSource for ProviderClient {
    async fn fetch_snapshot(&self, ticker: &str) -> Result<Option<MarketSnapshot>, FetchError> {
        let today = Utc::now().date_naive();

        let expirations = self.expirations(ticker).await?;
        let Some(nearest) = expirations.first().copied() else {
            info!(ticker, "no options expirations listed");
            return Ok(None);
        };
        let target = snapshot::select_target_expiration(&expirations, today)
            .ok_or_else(|| FetchError::Malformed("empty expiration list".to_string()))?;

        let (calls_near, puts_near) = self.chain(ticker, nearest).await?;
        let (calls_target, puts_target) = if target == nearest {
            (calls_near.clone(), puts_near.clone())
        } else {
            self.chain(ticker, target).await?
        };

        // Price and history are best-effort: a snapshot without either is
        // still scoreable.
        let quoted = match self.quote(ticker).await {
            Ok(p) => p,
            Err(e) => {
                warn!(ticker, error = %e, "quote request failed");
                None
            }
        };
        let historical_closes = match self.history(ticker).await {
            Ok(h) => h,
            Err(e) => {
                warn!(ticker, error = %e, "history request failed");
                Vec::new()
            }
        };

        let current_price = quoted
            .or_else(|| historical_closes.last().copied().filter(|p| *p > 0.0))
            .or_else(|| median_strike(&calls_near));

        Ok(Some(MarketSnapshot {
            ticker: ticker.to_string(),
            current_price,
            calls_near,
            puts_near,
            calls_target,
            puts_target,
            historical_closes,
            nearest_expiration: nearest,
            target_expiration: target,
        }))
    }

    async fn fetch_price(&self, ticker: &str) -> Result<Option<f64>, FetchError> {
        match self.quote(ticker).await? {
            Some(p) => Ok(Some(p)),
            None => Ok(self.history(ticker).await?.last().copied()),
        }
    }

    async fn pacing(&self) -> PacingStatus {
        self.pacer.status().await
    }
}

/// Median strike of a chain, the last resort when no price source works.
fn median_strike(quotes: &[OptionQuote]) -> Option<f64> {
    if quotes.is_empty() {
        return None;
    }
    let mut strikes: Vec<f64> = quotes.iter().map(|q| q.strike).collect();
    strikes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = strikes.len() / 2;
    Some(if strikes.len() % 2 == 0 {
        (strikes[mid - 1] + strikes[mid]) / 2.0
    } else {
        strikes[mid]
    })
}
