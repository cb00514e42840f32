use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Options unusual-activity scanner — score option chains, flag unusual
/// contracts, and serve the results over HTTP.
#[derive(Parser)]
#[command(name = "optscan", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve the HTTP API
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        #[arg(long, default_value = "8000")]
        port: u16,

        /// Directory for the cache file (default: ~/.optscan)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Score one ticker and print the interpretation
    Score {
        /// Stock ticker symbol
        ticker: String,

        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// List unusual contracts for one ticker
    Scan {
        /// Stock ticker symbol
        ticker: String,

        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Fetch and re-score a watchlist, once or on an interval
    Refresh {
        /// Tickers to refresh
        tickers: Vec<String>,

        /// File with one ticker per line (# comments allowed)
        #[arg(long)]
        watchlist: Option<PathBuf>,

        /// Seconds between refresh cycles
        #[arg(long, default_value = "900")]
        interval_secs: u64,

        /// Run one cycle then exit (for external cron)
        #[arg(long)]
        once: bool,

        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Rank tickers by today's volume z-score against their baseline
    UnusualVolume {
        /// SQLite database with historical_data / current_data tables
        #[arg(long, default_value = "optscan.db")]
        db: PathBuf,

        /// Number of tickers to show
        #[arg(long, default_value = "20")]
        top: usize,

        /// Minimum z-score to count as unusual
        #[arg(long, default_value = "2.0")]
        min_zscore: f64,

        /// Baseline lookback window in days
        #[arg(long)]
        lookback_days: Option<u32>,
    },
}
