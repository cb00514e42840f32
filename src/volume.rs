//! DB-backed unusual-volume screen: compares today's share volume for each
//! ticker against a trailing baseline and ranks by z-score. Independent of
//! the options scoring engine; shares only the SQLite file.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

const DEFAULT_LOOKBACK_DAYS: u32 = 90;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeBaseline {
    pub mean: f64,
    pub std: f64,
    pub median: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnusualVolumeRow {
    pub ticker: String,
    pub current_volume: i64,
    pub avg_volume: f64,
    pub volume_zscore: f64,
    pub volume_multiple: f64,
}

pub struct VolumeAnalyzer {
    conn: Connection,
    lookback_days: u32,
}

impl VolumeAnalyzer {
    pub fn open(path: &Path, lookback_days: u32) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("opening sqlite at {}", path.display()))?;
        Self::init(conn, lookback_days)
    }

    pub fn open_in_memory(lookback_days: u32) -> Result<Self> {
        Self::init(Connection::open_in_memory()?, lookback_days)
    }

    fn init(conn: Connection, lookback_days: u32) -> Result<Self> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS historical_data (
                ticker  TEXT NOT NULL,
                date    TEXT NOT NULL,
                volume  INTEGER NOT NULL,
                PRIMARY KEY (ticker, date)
            );

            CREATE TABLE IF NOT EXISTS current_data (
                ticker  TEXT NOT NULL,
                date    TEXT NOT NULL,
                volume  INTEGER NOT NULL,
                PRIMARY KEY (ticker, date)
            );
            ",
        )?;
        Ok(VolumeAnalyzer {
            conn,
            lookback_days,
        })
    }

    pub fn insert_historical(&self, ticker: &str, date: NaiveDate, volume: i64) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO historical_data (ticker, date, volume) VALUES (?1, ?2, ?3)",
            rusqlite::params![ticker.to_uppercase(), date.to_string(), volume],
        )?;
        Ok(())
    }

    pub fn insert_current(&self, ticker: &str, date: NaiveDate, volume: i64) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO current_data (ticker, date, volume) VALUES (?1, ?2, ?3)",
            rusqlite::params![ticker.to_uppercase(), date.to_string(), volume],
        )?;
        Ok(())
    }

    /// Baseline volume statistics over the lookback window. `None` when the
    /// window holds fewer than two observations (no sample std).
    pub fn baseline(&self, ticker: &str) -> Result<Option<VolumeBaseline>> {
        let mut stmt = self.conn.prepare(
            "SELECT volume FROM historical_data
             WHERE ticker = ?1 AND date >= date('now', ?2)
             ORDER BY date",
        )?;
        let volumes: Vec<i64> = stmt
            .query_map(
                rusqlite::params![
                    ticker.to_uppercase(),
                    format!("-{} days", self.lookback_days)
                ],
                |row| row.get(0),
            )?
            .collect::<rusqlite::Result<_>>()?;

        if volumes.len() < 2 {
            return Ok(None);
        }

        let values: Vec<f64> = volumes.iter().map(|v| *v as f64).collect();
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let var =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;

        let mut sorted = values.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Ok(Some(VolumeBaseline {
            mean,
            std: var.sqrt(),
            median,
        }))
    }

    /// Today's recorded volume, if any.
    pub fn current_volume(&self, ticker: &str) -> Result<Option<i64>> {
        let volume = self
            .conn
            .query_row(
                "SELECT volume FROM current_data
                 WHERE ticker = ?1 AND date = date('now')",
                rusqlite::params![ticker.to_uppercase()],
                |row| row.get(0),
            )
            .ok();
        Ok(volume)
    }

    /// Z-score of today's volume against the baseline. `None` when today's
    /// row is missing or the baseline is absent or degenerate (zero std).
    pub fn zscore(&self, ticker: &str) -> Result<Option<f64>> {
        let Some(current) = self.current_volume(ticker)? else {
            return Ok(None);
        };
        let Some(baseline) = self.baseline(ticker)? else {
            return Ok(None);
        };
        if baseline.std == 0.0 {
            return Ok(None);
        }
        Ok(Some((current as f64 - baseline.mean) / baseline.std))
    }

    /// Top `top_n` tickers whose volume today sits at least `min_zscore`
    /// standard deviations above baseline, ranked by z-score descending.
    pub fn top_unusual(&self, top_n: usize, min_zscore: f64) -> Result<Vec<UnusualVolumeRow>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT ticker FROM current_data WHERE date = date('now')")?;
        let tickers: Vec<String> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;

        let mut rows = Vec::new();
        for ticker in tickers {
            let Some(z) = self.zscore(&ticker)? else {
                continue;
            };
            if z < min_zscore {
                continue;
            }
            // zscore() already proved both of these exist
            let baseline = self.baseline(&ticker)?.context("baseline disappeared")?;
            let current = self
                .current_volume(&ticker)?
                .context("current volume disappeared")?;

            rows.push(UnusualVolumeRow {
                ticker,
                current_volume: current,
                avg_volume: baseline.mean,
                volume_zscore: z,
                volume_multiple: if baseline.mean > 0.0 {
                    current as f64 / baseline.mean
                } else {
                    0.0
                },
            });
        }

        rows.sort_by(|a, b| {
            b.volume_zscore
                .partial_cmp(&a.volume_zscore)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        rows.truncate(top_n);
        Ok(rows)
    }
}

/// Run the `unusual-volume` command: print the top unusual-volume tickers.
pub fn run(db: &Path, top: usize, min_zscore: f64, lookback_days: Option<u32>) -> Result<()> {
    let analyzer = VolumeAnalyzer::open(db, lookback_days.unwrap_or(DEFAULT_LOOKBACK_DAYS))?;
    let rows = analyzer.top_unusual(top, min_zscore)?;

    if rows.is_empty() {
        println!("No tickers with unusual volume today.");
        return Ok(());
    }

    println!(
        "{:<8} {:>14} {:>14} {:>8} {:>8}",
        "ticker", "volume", "avg volume", "z", "x avg"
    );
    for row in &rows {
        println!(
            "{:<8} {:>14} {:>14.0} {:>8.2} {:>8.2}",
            row.ticker, row.current_volume, row.avg_volume, row.volume_zscore, row.volume_multiple
        );
    }
    Ok(())
}
