use chrono::{Duration, Utc};
use optscan::volume::VolumeAnalyzer;

/// Seed `days` of history ending yesterday, one row per day.
fn seed_history(analyzer: &VolumeAnalyzer, ticker: &str, volumes: &[i64]) {
    let today = Utc::now().date_naive();
    for (i, volume) in volumes.iter().enumerate() {
        let date = today - Duration::days((volumes.len() - i) as i64);
        analyzer.insert_historical(ticker, date, *volume).unwrap();
    }
}

#[test]
fn baseline_needs_at_least_two_observations() {
    let analyzer = VolumeAnalyzer::open_in_memory(90).unwrap();
    assert!(analyzer.baseline("AAPL").unwrap().is_none());

    seed_history(&analyzer, "AAPL", &[1000]);
    assert!(analyzer.baseline("AAPL").unwrap().is_none());

    seed_history(&analyzer, "MSFT", &[900, 1100]);
    let baseline = analyzer.baseline("MSFT").unwrap().unwrap();
    assert_eq!(baseline.mean, 1000.0);
    assert_eq!(baseline.median, 1000.0);
}

#[test]
fn baseline_statistics_are_sample_based() {
    let analyzer = VolumeAnalyzer::open_in_memory(90).unwrap();
    seed_history(&analyzer, "AAPL", &[900, 1000, 1100, 1000, 1000]);

    let baseline = analyzer.baseline("AAPL").unwrap().unwrap();
    assert_eq!(baseline.mean, 1000.0);
    assert_eq!(baseline.median, 1000.0);
    // sample variance: (10000 + 0 + 10000 + 0 + 0) / 4 = 5000
    assert!((baseline.std - 5000.0_f64.sqrt()).abs() < 1e-9);
}

#[test]
fn zscore_requires_current_row_and_spread() {
    let analyzer = VolumeAnalyzer::open_in_memory(90).unwrap();
    let today = Utc::now().date_naive();

    // No current row yet.
    seed_history(&analyzer, "AAPL", &[900, 1000, 1100, 1000, 1000]);
    assert!(analyzer.zscore("AAPL").unwrap().is_none());

    analyzer.insert_current("AAPL", today, 1200).unwrap();
    let z = analyzer.zscore("AAPL").unwrap().unwrap();
    assert!((z - 200.0 / 5000.0_f64.sqrt()).abs() < 1e-9);

    // Flat history has zero spread: no z-score rather than a division blowup.
    seed_history(&analyzer, "FLAT", &[1000, 1000, 1000]);
    analyzer.insert_current("FLAT", today, 5000).unwrap();
    assert!(analyzer.zscore("FLAT").unwrap().is_none());
}

#[test]
fn top_unusual_filters_and_ranks() {
    let analyzer = VolumeAnalyzer::open_in_memory(90).unwrap();
    let today = Utc::now().date_naive();

    // HOT: z ≈ 2.83, well above the threshold.
    seed_history(&analyzer, "HOT", &[900, 1000, 1100, 1000, 1000]);
    analyzer.insert_current("HOT", today, 1200).unwrap();

    // HOTTER: same baseline, bigger spike.
    seed_history(&analyzer, "HOTTER", &[900, 1000, 1100, 1000, 1000]);
    analyzer.insert_current("HOTTER", today, 1500).unwrap();

    // QUIET: today is right at baseline.
    seed_history(&analyzer, "QUIET", &[900, 1000, 1100, 1000, 1000]);
    analyzer.insert_current("QUIET", today, 1000).unwrap();

    // NODATA: current row but no history.
    analyzer.insert_current("NODATA", today, 99999).unwrap();

    let rows = analyzer.top_unusual(20, 2.0).unwrap();
    let tickers: Vec<&str> = rows.iter().map(|r| r.ticker.as_str()).collect();
    assert_eq!(tickers, vec!["HOTTER", "HOT"]);

    assert_eq!(rows[0].current_volume, 1500);
    assert_eq!(rows[0].avg_volume, 1000.0);
    assert!((rows[0].volume_multiple - 1.5).abs() < 1e-9);
}

#[test]
fn top_unusual_respects_top_n() {
    let analyzer = VolumeAnalyzer::open_in_memory(90).unwrap();
    let today = Utc::now().date_naive();

    for i in 0..4 {
        let ticker = format!("T{i}");
        seed_history(&analyzer, &ticker, &[900, 1000, 1100, 1000, 1000]);
        analyzer
            .insert_current(&ticker, today, 1300 + i * 100)
            .unwrap();
    }

    let rows = analyzer.top_unusual(2, 2.0).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].ticker, "T3");
    assert_eq!(rows[1].ticker, "T2");
}

#[test]
fn lookback_window_excludes_old_history() {
    // A 2-day lookback only sees the recent flat rows, so the early spread
    // is invisible and the z-score degenerates away.
    let analyzer = VolumeAnalyzer::open_in_memory(2).unwrap();
    let today = Utc::now().date_naive();
    seed_history(&analyzer, "AAPL", &[1, 1000000, 1000, 1000]);
    analyzer.insert_current("AAPL", today, 5000).unwrap();

    assert!(analyzer.zscore("AAPL").unwrap().is_none());
}
