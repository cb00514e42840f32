//! In-process cache for prices, snapshots and scores, persisted as a single
//! JSON file. Entries carry their write timestamp; reads ignore anything
//! past its section's TTL and flushes prune it.
//!
//! Persistence is deterministic: every 16th write flushes, and callers flush
//! explicitly at cycle boundaries (scheduler pass, server shutdown).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::model::score::TickerScore;
use crate::model::snapshot::MarketSnapshot;

const PRICE_TTL_SECS: i64 = 3600;
const SNAPSHOT_TTL_SECS: i64 = 4 * 3600;
const SCORE_TTL_SECS: i64 = 12 * 3600;
/// Writes between automatic flushes.
const FLUSH_EVERY: u32 = 16;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry<T> {
    value: T,
    timestamp: DateTime<Utc>,
}

impl<T> Entry<T> {
    fn fresh(&self, ttl_secs: i64) -> bool {
        Utc::now() - self.timestamp < Duration::seconds(ttl_secs)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Sections {
    prices: HashMap<String, Entry<f64>>,
    snapshots: HashMap<String, Entry<MarketSnapshot>>,
    scores: HashMap<String, Entry<TickerScore>>,
}

pub struct ScanCache {
    path: PathBuf,
    sections: Sections,
    writes_since_flush: u32,
}

impl ScanCache {
    /// Load the cache file if present, dropping entries that expired while
    /// the process was down. A missing or unreadable file starts empty.
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join("cache.json");
        let sections = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Sections>(&contents) {
                Ok(mut s) => {
                    prune(&mut s.prices, PRICE_TTL_SECS);
                    prune(&mut s.snapshots, SNAPSHOT_TTL_SECS);
                    prune(&mut s.scores, SCORE_TTL_SECS);
                    info!(
                        prices = s.prices.len(),
                        snapshots = s.snapshots.len(),
                        scores = s.scores.len(),
                        "loaded cache from disk"
                    );
                    s
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cache file unreadable, starting empty");
                    Sections::default()
                }
            },
            Err(_) => Sections::default(),
        };

        ScanCache {
            path,
            sections,
            writes_since_flush: 0,
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn price(&self, ticker: &str) -> Option<f64> {
        get(&self.sections.prices, ticker, PRICE_TTL_SECS).copied()
    }

    pub fn snapshot(&self, ticker: &str) -> Option<MarketSnapshot> {
        get(&self.sections.snapshots, ticker, SNAPSHOT_TTL_SECS).cloned()
    }

    pub fn score(&self, ticker: &str) -> Option<TickerScore> {
        get(&self.sections.scores, ticker, SCORE_TTL_SECS).cloned()
    }

    /// All fresh cached scores, for the portfolio breakdown.
    pub fn scores(&self) -> Vec<TickerScore> {
        self.sections
            .scores
            .values()
            .filter(|e| e.fresh(SCORE_TTL_SECS))
            .map(|e| e.value.clone())
            .collect()
    }

    /// All fresh cached snapshots.
    pub fn snapshots(&self) -> Vec<MarketSnapshot> {
        self.sections
            .snapshots
            .values()
            .filter(|e| e.fresh(SNAPSHOT_TTL_SECS))
            .map(|e| e.value.clone())
            .collect()
    }

    /// Fresh entry counts per section: (prices, snapshots, scores).
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.sections
                .prices
                .values()
                .filter(|e| e.fresh(PRICE_TTL_SECS))
                .count(),
            self.sections
                .snapshots
                .values()
                .filter(|e| e.fresh(SNAPSHOT_TTL_SECS))
                .count(),
            self.sections
                .scores
                .values()
                .filter(|e| e.fresh(SCORE_TTL_SECS))
                .count(),
        )
    }

    // ── Writes ───────────────────────────────────────────────────────

    pub fn set_price(&mut self, ticker: &str, price: f64) {
        self.sections.prices.insert(
            ticker.to_uppercase(),
            Entry {
                value: price,
                timestamp: Utc::now(),
            },
        );
        self.note_write();
    }

    pub fn set_snapshot(&mut self, snapshot: MarketSnapshot) {
        self.sections.snapshots.insert(
            snapshot.ticker.to_uppercase(),
            Entry {
                value: snapshot,
                timestamp: Utc::now(),
            },
        );
        self.note_write();
    }

    pub fn set_score(&mut self, score: TickerScore) {
        self.sections.scores.insert(
            score.ticker.to_uppercase(),
            Entry {
                value: score,
                timestamp: Utc::now(),
            },
        );
        self.note_write();
    }

    fn note_write(&mut self) {
        self.writes_since_flush += 1;
        if self.writes_since_flush >= FLUSH_EVERY {
            if let Err(e) = self.flush() {
                warn!(error = %e, "periodic cache flush failed");
            }
        }
    }

    /// Write all fresh entries to disk.
    pub fn flush(&mut self) -> Result<()> {
        prune(&mut self.sections.prices, PRICE_TTL_SECS);
        prune(&mut self.sections.snapshots, SNAPSHOT_TTL_SECS);
        prune(&mut self.sections.scores, SCORE_TTL_SECS);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating cache dir {}", parent.display()))?;
        }
        let file = std::fs::File::create(&self.path)
            .with_context(|| format!("creating {}", self.path.display()))?;
        serde_json::to_writer(file, &self.sections).context("writing cache file")?;

        self.writes_since_flush = 0;
        debug!(path = %self.path.display(), "cache flushed to disk");
        Ok(())
    }

    /// Drop everything, memory and disk file both.
    pub fn clear(&mut self) -> Result<()> {
        self.sections = Sections::default();
        self.writes_since_flush = 0;
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("removing {}", self.path.display()))?;
        }
        Ok(())
    }
}

fn get<'a, T>(map: &'a HashMap<String, Entry<T>>, ticker: &str, ttl_secs: i64) -> Option<&'a T> {
    map.get(&ticker.to_uppercase())
        .filter(|e| e.fresh(ttl_secs))
        .map(|e| &e.value)
}

fn prune<T>(map: &mut HashMap<String, Entry<T>>, ttl_secs: i64) {
    map.retain(|_, e| e.fresh(ttl_secs));
}
