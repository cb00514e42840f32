//! Periodic watchlist refresh: fetch and re-score every ticker, flush the
//! cache, sleep, repeat. Individual ticker failures are logged and skipped;
//! the loop itself only stops in `--once` mode.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::scan::Scanner;

pub struct RefreshConfig {
    pub tickers: Vec<String>,
    pub watchlist: Option<PathBuf>,
    pub interval: Duration,
    pub once: bool,
}

/// Run the `refresh` command.
pub fn run(config: &RefreshConfig, data_dir: &Path) -> Result<()> {
    let mut tickers: Vec<String> = config.tickers.iter().map(|t| t.to_uppercase()).collect();
    if let Some(path) = &config.watchlist {
        tickers.extend(load_watchlist(path)?);
    }
    let mut seen = std::collections::HashSet::new();
    tickers.retain(|t| seen.insert(t.clone()));
    if tickers.is_empty() {
        bail!("no tickers to refresh; pass tickers or --watchlist");
    }

    let rt = tokio::runtime::Runtime::new().context("creating async runtime")?;
    rt.block_on(async {
        let scanner = Scanner::from_env(data_dir)?;

        loop {
            let (ok, failed) = refresh_cycle(&scanner, &tickers).await;
            if let Err(e) = scanner.flush_cache().await {
                warn!(error = %e, "cache flush after refresh cycle failed");
            }
            println!("Refresh cycle done: {ok} scored, {failed} failed");

            if config.once {
                return Ok(());
            }
            tokio::time::sleep(config.interval).await;
        }
    })
}

/// Refresh every ticker once, returning (succeeded, failed) counts.
pub async fn refresh_cycle(scanner: &Scanner, tickers: &[String]) -> (u32, u32) {
    let mut ok = 0u32;
    let mut failed = 0u32;

    for (i, ticker) in tickers.iter().enumerate() {
        info!(%ticker, "refreshing ({}/{})", i + 1, tickers.len());
        match scanner.refresh(ticker).await {
            Ok(Some(score)) => {
                println!(
                    "[{}/{}] {} → score {}/10",
                    i + 1,
                    tickers.len(),
                    ticker,
                    score.score
                );
                ok += 1;
            }
            Ok(None) => {
                println!("[{}/{}] {} → no options data", i + 1, tickers.len(), ticker);
                ok += 1;
            }
            Err(e) => {
                warn!(%ticker, error = %format!("{e:#}"), "refresh failed, skipping");
                failed += 1;
            }
        }
    }

    (ok, failed)
}

/// One ticker per line; blank lines and `#` comments are skipped.
fn load_watchlist(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading watchlist {}", path.display()))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_uppercase)
        .collect())
}
