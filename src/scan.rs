//! Cache-aware scan pipeline: ties the snapshot source, the scoring engine
//! and the cache together for the CLI, the scheduler and the HTTP API.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;

use crate::cache::ScanCache;
use crate::engine;
use crate::engine::aggregate::ActivityBreakdown;
use crate::fetch::{PacingStatus, ProviderClient, SnapshotSource};
use crate::model::contract::UnusualContract;
use crate::model::score::TickerScore;
use crate::model::snapshot::MarketSnapshot;

/// Which portfolio aggregation to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakdownView {
    Contracts,
    Sentiment,
}

#[derive(Clone)]
pub struct Scanner {
    source: Arc<dyn SnapshotSource>,
    cache: Arc<RwLock<ScanCache>>,
}

impl Scanner {
    pub fn new(source: Arc<dyn SnapshotSource>, cache: ScanCache) -> Self {
        Scanner {
            source,
            cache: Arc::new(RwLock::new(cache)),
        }
    }

    /// Provider client from the environment plus the cache file under
    /// `data_dir`.
    pub fn from_env(data_dir: &Path) -> Result<Self> {
        let client = ProviderClient::from_env().context("building provider client")?;
        Ok(Scanner::new(Arc::new(client), ScanCache::load(data_dir)))
    }

    /// Snapshot for `ticker`, cache-first. `Ok(None)` means the provider has
    /// no options data.
    pub async fn snapshot(&self, ticker: &str) -> Result<Option<MarketSnapshot>> {
        let ticker = ticker.to_uppercase();
        if let Some(snapshot) = self.cache.read().await.snapshot(&ticker) {
            return Ok(Some(snapshot));
        }

        info!(%ticker, "fetching fresh snapshot");
        let Some(snapshot) = self.source.fetch_snapshot(&ticker).await? else {
            return Ok(None);
        };

        let mut cache = self.cache.write().await;
        if let Some(price) = snapshot.current_price {
            cache.set_price(&ticker, price);
        }
        cache.set_snapshot(snapshot.clone());
        Ok(Some(snapshot))
    }

    /// Scored ticker, cache-first. Scores computed here are cached; the
    /// "no options data" outcome is not.
    pub async fn score(&self, ticker: &str) -> Result<Option<TickerScore>> {
        let ticker = ticker.to_uppercase();
        if let Some(score) = self.cache.read().await.score(&ticker) {
            return Ok(Some(score));
        }

        let Some(snapshot) = self.snapshot(&ticker).await? else {
            return Ok(None);
        };

        let score = build_score(&ticker, &snapshot);
        self.cache.write().await.set_score(score.clone());
        Ok(Some(score))
    }

    /// Re-fetch and re-score `ticker` unconditionally, overwriting whatever
    /// the cache held. Used by the periodic refresh loop.
    pub async fn refresh(&self, ticker: &str) -> Result<Option<TickerScore>> {
        let ticker = ticker.to_uppercase();
        let Some(snapshot) = self.source.fetch_snapshot(&ticker).await? else {
            return Ok(None);
        };

        let score = build_score(&ticker, &snapshot);
        let mut cache = self.cache.write().await;
        if let Some(price) = snapshot.current_price {
            cache.set_price(&ticker, price);
        }
        cache.set_snapshot(snapshot);
        cache.set_score(score.clone());
        Ok(Some(score))
    }

    /// Unusual contracts for `ticker`, paired with the snapshot they came
    /// from so callers can report the underlying price.
    pub async fn unusual(
        &self,
        ticker: &str,
    ) -> Result<Option<(MarketSnapshot, Vec<UnusualContract>)>> {
        let Some(snapshot) = self.snapshot(ticker).await? else {
            return Ok(None);
        };
        let contracts = engine::unusual_contracts(&snapshot, Utc::now().date_naive());
        Ok(Some((snapshot, contracts)))
    }

    /// Underlying price only, cache-first.
    pub async fn price(&self, ticker: &str) -> Result<Option<f64>> {
        let ticker = ticker.to_uppercase();
        if let Some(price) = self.cache.read().await.price(&ticker) {
            return Ok(Some(price));
        }
        let Some(price) = self.source.fetch_price(&ticker).await? else {
            return Ok(None);
        };
        self.cache.write().await.set_price(&ticker, price);
        Ok(Some(price))
    }

    /// Portfolio bullish/bearish breakdown from cached results.
    pub async fn breakdown(&self, view: BreakdownView) -> ActivityBreakdown {
        let cache = self.cache.read().await;
        match view {
            BreakdownView::Sentiment => {
                let pairs: Vec<(String, f64)> = cache
                    .scores()
                    .into_iter()
                    .map(|s| (s.ticker, s.raw_data.pcr_near))
                    .collect();
                engine::sentiment_view(&pairs)
            }
            BreakdownView::Contracts => {
                let today = Utc::now().date_naive();
                let contracts: Vec<UnusualContract> = cache
                    .snapshots()
                    .iter()
                    .flat_map(|s| engine::unusual_contracts(s, today))
                    .collect();
                engine::contract_view(&contracts)
            }
        }
    }

    pub async fn pacing(&self) -> PacingStatus {
        self.source.pacing().await
    }

    /// Fresh cache entry counts: (prices, snapshots, scores).
    pub async fn cache_counts(&self) -> (usize, usize, usize) {
        self.cache.read().await.counts()
    }

    pub async fn flush_cache(&self) -> Result<()> {
        self.cache.write().await.flush()
    }

    pub async fn clear_cache(&self) -> Result<()> {
        self.cache.write().await.clear()
    }
}

/// Score a snapshot and assemble the full cached/served record.
fn build_score(ticker: &str, snapshot: &MarketSnapshot) -> TickerScore {
    let result = engine::score_snapshot(snapshot);
    let interpretation = engine::interpret(&result);
    TickerScore {
        ticker: ticker.to_string(),
        current_price: snapshot.current_price,
        score: result.score,
        interpretation,
        components: result.components,
        raw_data: result.raw_data,
        nearest_expiry: Some(snapshot.nearest_expiration),
        target_expiry: Some(snapshot.target_expiration),
    }
}

// ── CLI entry points ─────────────────────────────────────────────────

/// Run the `score` command: score one ticker and print the interpretation.
pub fn run_score(ticker: &str, data_dir: &Path) -> Result<()> {
    let rt = tokio::runtime::Runtime::new().context("creating async runtime")?;
    rt.block_on(async {
        let scanner = Scanner::from_env(data_dir)?;
        match scanner.score(ticker).await? {
            Some(score) => {
                for line in &score.interpretation {
                    println!("{line}");
                }
                println!();
                println!("  volume/OI ratio:  {:.2}", score.components.volume_oi_ratio);
                println!("  put/call ratio:   {:.2}", score.components.put_call_ratio);
                println!("  IV vs historical: {:.2}", score.components.iv_vs_historical);
                println!("  skew:             {:.2}", score.components.skew_analysis);
            }
            None => println!("No options data available for {}", ticker.to_uppercase()),
        }
        scanner.flush_cache().await?;
        Ok(())
    })
}

/// Run the `scan` command: print unusual contracts for one ticker.
pub fn run_scan(ticker: &str, data_dir: &Path) -> Result<()> {
    let rt = tokio::runtime::Runtime::new().context("creating async runtime")?;
    rt.block_on(async {
        let scanner = Scanner::from_env(data_dir)?;
        match scanner.unusual(ticker).await? {
            Some((_, contracts)) if !contracts.is_empty() => {
                println!(
                    "{} unusual contracts for {}:",
                    contracts.len(),
                    ticker.to_uppercase()
                );
                for c in &contracts {
                    println!(
                        "  {}  {:>5}  strike {:<8} vol {:<7} OI {:<7} vol/OI {:<5} IV {}%",
                        c.option_symbol,
                        c.option_type.as_str(),
                        c.strike_price,
                        c.current_volume,
                        c.open_interest,
                        c.volume_ratio,
                        c.implied_volatility,
                    );
                }
            }
            Some(_) => println!("No unusual activity for {}", ticker.to_uppercase()),
            None => println!("No options data available for {}", ticker.to_uppercase()),
        }
        scanner.flush_cache().await?;
        Ok(())
    })
}

/// Default data directory: `~/.optscan`.
pub fn resolve_data_dir(data_dir: Option<PathBuf>) -> PathBuf {
    data_dir.unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".optscan")
    })
}
