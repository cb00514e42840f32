
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use fixtures::*;

use optscan::cache::ScanCache;
use optscan::fetch::{FetchError, SnapshotSource};
use optscan::model::snapshot::MarketSnapshot;
use optscan::scan::{BreakdownView, Scanner};

/// Mock source with a fixed snapshot per ticker and a fetch counter.
struct MockSource {
    snapshots: Vec<MarketSnapshot>,
    fetches: AtomicUsize,
}

impl MockSource {
    fn new(snapshots: Vec<MarketSnapshot>) -> Self {
        MockSource {
            snapshots,
            fetches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SnapshotSource for MockSource {
    async fn fetch_snapshot(&self, ticker: &str) -> Result<Option<MarketSnapshot>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshots.iter().find(|s| s.ticker == ticker).cloned())
    }

    async fn fetch_price(&self, _ticker: &str) -> Result<Option<f64>, FetchError> {
        Ok(Some(100.0))
    }
}

fn scanner_with(snapshots: Vec<MarketSnapshot>, dir: &std::path::Path) -> (Scanner, Arc<MockSource>) {
    let source = Arc::new(MockSource::new(snapshots));
    let scanner = Scanner::new(source.clone(), ScanCache::load(dir));
    (scanner, source)
}

#[tokio::test]
async fn score_is_computed_once_then_served_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let (scanner, source) = scanner_with(vec![base_snapshot()], dir.path());

    let first = scanner.score("test").await.unwrap().unwrap();
    assert_eq!(first.ticker, "TEST");
    assert_eq!(first.score, 5);
    assert_eq!(first.nearest_expiry, Some(date("2025-06-06")));
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

    let second = scanner.score("TEST").await.unwrap().unwrap();
    assert_eq!(first, second);
    // Cache hit: the source was not consulted again.
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unknown_ticker_scores_none_and_is_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let (scanner, source) = scanner_with(vec![], dir.path());

    assert!(scanner.score("NOPE").await.unwrap().is_none());
    assert!(scanner.score("NOPE").await.unwrap().is_none());
    // No negative caching: both calls reached the source.
    assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn refresh_bypasses_the_score_cache() {
    let dir = tempfile::tempdir().unwrap();
    let (scanner, source) = scanner_with(vec![base_snapshot()], dir.path());

    scanner.score("TEST").await.unwrap().unwrap();
    scanner.refresh("TEST").await.unwrap().unwrap();
    assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unusual_pairs_snapshot_with_contracts() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = MarketSnapshot {
        calls_near: vec![quote(95.0, 50, 20, 0.3, 1.25)],
        ..base_snapshot()
    };
    let (scanner, _) = scanner_with(vec![snapshot], dir.path());

    let (snap, contracts) = scanner.unusual("TEST").await.unwrap().unwrap();
    assert_eq!(snap.ticker, "TEST");
    assert_eq!(contracts.len(), 1);
    assert_eq!(contracts[0].option_symbol, "TESTC9500");
}

#[tokio::test]
async fn sentiment_breakdown_reads_cached_scores() {
    let dir = tempfile::tempdir().unwrap();

    // BEAR's near chain is put-heavy (PCR 5.0 from empty calls), BULL's is
    // call-heavy via a low put value.
    let bear = MarketSnapshot {
        ticker: "BEAR".to_string(),
        puts_near: vec![quote(100.0, 100, 0, 0.3, 10.0)],
        ..base_snapshot()
    };
    let bull = MarketSnapshot {
        ticker: "BULL".to_string(),
        calls_near: vec![quote(100.0, 100, 0, 0.3, 10.0)],
        puts_near: vec![quote(100.0, 10, 0, 0.3, 10.0)],
        ..base_snapshot()
    };
    let (scanner, _) = scanner_with(vec![bear, bull], dir.path());

    scanner.score("BEAR").await.unwrap().unwrap();
    scanner.score("BULL").await.unwrap().unwrap();

    let breakdown = scanner.breakdown(BreakdownView::Sentiment).await;
    assert_eq!(breakdown.bearish_tickers, vec!["BEAR"]);
    assert_eq!(breakdown.bullish_tickers, vec!["BULL"]);
    assert_eq!(breakdown.total_unusual, 2);
}

#[tokio::test]
async fn contracts_breakdown_scans_cached_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = MarketSnapshot {
        calls_near: vec![quote(95.0, 50, 20, 0.3, 1.25)],
        ..base_snapshot()
    };
    let (scanner, _) = scanner_with(vec![snapshot], dir.path());
    scanner.score("TEST").await.unwrap();

    let breakdown = scanner.breakdown(BreakdownView::Contracts).await;
    assert_eq!(breakdown.total_unusual, 1);
    assert_eq!(breakdown.calls, 1);
    assert_eq!(breakdown.bullish_tickers, vec!["TEST"]);
}
