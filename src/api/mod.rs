pub mod error;
pub mod handlers;
pub mod state;
pub mod types;

use std::path::Path;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::scan::Scanner;
use state::AppState;

/// Run the `serve` command: build the scanner and serve until interrupted,
/// flushing the cache on the way out.
pub fn run(host: &str, port: u16, data_dir: &Path) -> Result<()> {
    let rt = tokio::runtime::Runtime::new().context("creating async runtime")?;
    rt.block_on(serve(host, port, data_dir))
}

pub async fn serve(host: &str, port: u16, data_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;

    let scanner = Scanner::from_env(data_dir)?;
    let state = AppState::new(scanner.clone());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(handlers::status::root))
        .route("/api-status", get(handlers::status::api_status))
        .route(
            "/unusualness-score/{ticker}",
            get(handlers::score::unusualness_score),
        )
        .route("/ticker/{ticker}", get(handlers::activity::ticker_activity))
        .route("/bullish-bearish", get(handlers::breakdown::bullish_bearish))
        .route("/clear-cache", post(handlers::status::clear_cache))
        .layer(cors)
        .with_state(state);

    let addr = format!("{host}:{port}");
    println!("optscan API server listening on {addr}");
    println!("  Score:     GET  http://{addr}/unusualness-score/{{ticker}}");
    println!("  Activity:  GET  http://{addr}/ticker/{{ticker}}");
    println!("  Breakdown: GET  http://{addr}/bullish-bearish");
    println!("  Status:    GET  http://{addr}/api-status");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
        .context("running server")?;

    scanner.flush_cache().await.context("flushing cache on shutdown")?;
    Ok(())
}
