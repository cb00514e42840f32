use clap::Parser;
use tracing_subscriber::EnvFilter;

use optscan::cli::{Cli, Command};
use optscan::scan::resolve_data_dir;
use optscan::{api, scan, scheduler, volume};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("optscan=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            host,
            port,
            data_dir,
        } => api::run(&host, port, &resolve_data_dir(data_dir)),
        Command::Score { ticker, data_dir } => {
            scan::run_score(&ticker, &resolve_data_dir(data_dir))
        }
        Command::Scan { ticker, data_dir } => scan::run_scan(&ticker, &resolve_data_dir(data_dir)),
        Command::Refresh {
            tickers,
            watchlist,
            interval_secs,
            once,
            data_dir,
        } => scheduler::run(
            &scheduler::RefreshConfig {
                tickers,
                watchlist,
                interval: std::time::Duration::from_secs(interval_secs),
                once,
            },
            &resolve_data_dir(data_dir),
        ),
        Command::UnusualVolume {
            db,
            top,
            min_zscore,
            lookback_days,
        } => volume::run(&db, top, min_zscore, lookback_days),
    }
}
