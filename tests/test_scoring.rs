
use fixtures::*;
use optscan::engine::score_snapshot;
use optscan::model::score::FallbackReason;
use optscan::model::snapshot::MarketSnapshot;

#[test]
fn base_snapshot_components_are_exact() {
    let result = score_snapshot(&base_snapshot());

    // Empty chains: no vol/OI signal, both PCRs default to 5.0 (no call
    // value), IV falls back on missing history, skew on empty OTM sides.
    assert_eq!(result.components.volume_oi_ratio, 0.0);
    assert_eq!(result.components.put_call_ratio, 3.0);
    assert_eq!(result.components.iv_vs_historical, 1.0);
    assert_eq!(result.components.skew_analysis, 1.0);
    assert_eq!(result.raw_data.pcr_near, 5.0);
    assert_eq!(result.raw_data.pcr_target, 5.0);
    assert_eq!(result.score, 5);
}

#[test]
fn scoring_is_idempotent() {
    let snapshot = balanced_pcr_snapshot();
    let first = score_snapshot(&snapshot);
    let second = score_snapshot(&snapshot);
    assert_eq!(first, second);
}

#[test]
fn pcr_score_is_zero_at_the_anchor() {
    let result = score_snapshot(&balanced_pcr_snapshot());
    assert_eq!(result.raw_data.pcr_near, 0.7);
    assert_eq!(result.raw_data.pcr_target, 0.7);
    assert_eq!(result.components.put_call_ratio, 0.0);
}

#[test]
fn pcr_deviation_scores_per_side() {
    // calls trade $1000 of value, puts $2000: PCR 2.0, and this side
    // contributes min(|2.0 - 0.7| * 1.5, 2) = 1.95. The target pair stays
    // pinned at the 0.7 anchor and contributes nothing.
    let balanced = balanced_pcr_snapshot();
    let snapshot = MarketSnapshot {
        calls_near: vec![quote(100.0, 100, 0, 0.3, 10.0)],
        puts_near: vec![quote(100.0, 100, 0, 0.3, 20.0)],
        ..balanced
    };

    let result = score_snapshot(&snapshot);
    assert_eq!(result.raw_data.pcr_near, 2.0);
    assert_eq!(result.raw_data.pcr_target, 0.7);
    assert_eq!(result.components.put_call_ratio, 1.95);
}

#[test]
fn pcr_component_is_clamped_to_three() {
    // Both sides far from the anchor would sum to 4; the clamp holds at 3.
    let snapshot = MarketSnapshot {
        calls_near: vec![quote(100.0, 100, 0, 0.3, 1.0)],
        puts_near: vec![quote(100.0, 100, 0, 0.3, 50.0)],
        calls_target: vec![quote(100.0, 100, 0, 0.3, 1.0)],
        puts_target: vec![quote(100.0, 100, 0, 0.3, 50.0)],
        ..base_snapshot()
    };

    let result = score_snapshot(&snapshot);
    assert_eq!(result.components.put_call_ratio, 3.0);
}

#[test]
fn vol_oi_score_scales_with_average_ratio() {
    // One near call with volume 80 / OI 20 → chain ratio 4, averaged over
    // four chains → 1.0 → score 0.5.
    let snapshot = MarketSnapshot {
        calls_near: vec![quote(100.0, 80, 20, 0.3, 1.0)],
        ..base_snapshot()
    };
    let result = score_snapshot(&snapshot);
    assert_eq!(result.raw_data.avg_vol_oi, 1.0);
    assert_eq!(result.components.volume_oi_ratio, 0.5);

    // Volume 320 / OI 20 → chain ratio 16 → average 4 → score clamps at 2.
    let snapshot = MarketSnapshot {
        calls_near: vec![quote(100.0, 320, 20, 0.3, 1.0)],
        ..base_snapshot()
    };
    let result = score_snapshot(&snapshot);
    assert_eq!(result.raw_data.avg_vol_oi, 4.0);
    assert_eq!(result.components.volume_oi_ratio, 2.0);
}

#[test]
fn vol_oi_per_quote_ratio_is_capped_at_twenty() {
    // Volume 1000 / OI 20 is a raw ratio of 50, clamped to 20 per quote.
    let snapshot = MarketSnapshot {
        calls_near: vec![quote(100.0, 1000, 20, 0.3, 1.0)],
        ..base_snapshot()
    };
    let result = score_snapshot(&snapshot);
    assert_eq!(result.raw_data.avg_vol_oi, 5.0);
}

#[test]
fn vol_oi_ignores_thin_open_interest() {
    // Scenario: every quote has zero open interest → vol/OI score is 0.
    let snapshot = MarketSnapshot {
        calls_near: vec![quote(100.0, 500, 0, 0.3, 1.0)],
        puts_near: vec![quote(100.0, 500, 0, 0.3, 1.0)],
        calls_target: vec![quote(100.0, 500, 0, 0.3, 1.0)],
        puts_target: vec![quote(100.0, 500, 0, 0.3, 1.0)],
        ..base_snapshot()
    };
    let result = score_snapshot(&snapshot);
    assert_eq!(result.components.volume_oi_ratio, 0.0);
    assert_eq!(result.raw_data.avg_vol_oi, 0.0);
}

#[test]
fn iv_defaults_on_short_history() {
    // 19 closes is one short of the minimum, whatever else is present.
    let snapshot = MarketSnapshot {
        historical_closes: vec![100.0; 19],
        calls_near: vec![quote(100.0, 10, 0, 0.5, 1.0)],
        puts_near: vec![quote(100.0, 10, 0, 0.5, 1.0)],
        ..base_snapshot()
    };
    let result = score_snapshot(&snapshot);
    assert_eq!(result.components.iv_vs_historical, 1.0);
    assert!(
        result
            .fallbacks
            .iter()
            .any(|f| f.component == "iv_vs_historical"
                && f.reason == FallbackReason::InsufficientHistory)
    );
}

#[test]
fn iv_defaults_when_no_atm_quotes() {
    // Enough history but every strike sits outside the ±5% band.
    let snapshot = MarketSnapshot {
        historical_closes: vec![100.0; 30],
        calls_near: vec![quote(150.0, 10, 0, 0.5, 1.0)],
        puts_near: vec![quote(50.0, 10, 0, 0.5, 1.0)],
        ..base_snapshot()
    };
    let result = score_snapshot(&snapshot);
    assert_eq!(result.components.iv_vs_historical, 1.5);
    assert!(
        result
            .fallbacks
            .iter()
            .any(|f| f.component == "iv_vs_historical" && f.reason == FallbackReason::NoAtmQuotes)
    );
}

#[test]
fn iv_uses_ratio_default_when_realized_vol_is_zero() {
    // Flat closes → zero historical vol → IV/HV ratio defaults to 2, so the
    // component is |2 − 1.15| × 3 = 2.55 regardless of the quoted IVs.
    let snapshot = MarketSnapshot {
        historical_closes: vec![100.0; 30],
        calls_near: vec![quote(100.0, 10, 0, 0.5, 1.0)],
        puts_near: vec![quote(100.0, 10, 0, 0.5, 1.0)],
        ..base_snapshot()
    };
    let result = score_snapshot(&snapshot);
    assert_eq!(result.components.iv_vs_historical, 2.55);
    assert!(
        !result
            .fallbacks
            .iter()
            .any(|f| f.component == "iv_vs_historical")
    );
}

#[test]
fn skew_scores_three_when_otm_call_iv_is_zero() {
    let snapshot = MarketSnapshot {
        calls_near: vec![quote(115.0, 10, 0, 0.0, 1.0)],
        puts_near: vec![quote(85.0, 10, 0, 0.5, 1.0)],
        ..base_snapshot()
    };
    let result = score_snapshot(&snapshot);
    assert_eq!(result.components.skew_analysis, 3.0);
}

#[test]
fn skew_is_zero_at_the_anchor_ratio() {
    // Put IV / call IV of exactly 1.2 is the "normal" skew.
    let snapshot = MarketSnapshot {
        calls_near: vec![quote(115.0, 10, 0, 0.5, 1.0)],
        puts_near: vec![quote(85.0, 10, 0, 0.6, 1.0)],
        ..base_snapshot()
    };
    let result = score_snapshot(&snapshot);
    assert_eq!(result.components.skew_analysis, 0.0);
}

#[test]
fn missing_price_degrades_iv_and_skew_only() {
    let snapshot = MarketSnapshot {
        current_price: None,
        historical_closes: vec![100.0; 30],
        calls_near: vec![quote(115.0, 80, 20, 0.5, 10.0)],
        puts_near: vec![quote(85.0, 56, 20, 0.6, 10.0)],
        ..base_snapshot()
    };

    let result = score_snapshot(&snapshot);
    assert_eq!(result.components.iv_vs_historical, 1.0);
    assert_eq!(result.components.skew_analysis, 1.0);
    // The price-free legs still compute.
    assert!(result.components.volume_oi_ratio > 0.0);
    let reasons: Vec<FallbackReason> = result.fallbacks.iter().map(|f| f.reason).collect();
    assert_eq!(
        reasons,
        vec![FallbackReason::MissingPrice, FallbackReason::MissingPrice]
    );
}

#[test]
fn total_score_is_always_an_integer_in_range() {
    let snapshots = [
        base_snapshot(),
        balanced_pcr_snapshot(),
        MarketSnapshot {
            current_price: None,
            ..base_snapshot()
        },
        MarketSnapshot {
            // Everything loud at once: heavy vol/OI, skewed PCR, zero-call-IV
            // skew, flat realized vol.
            historical_closes: vec![100.0; 30],
            calls_near: vec![quote(100.0, 1000, 20, 0.0, 1.0), quote(115.0, 10, 0, 0.0, 1.0)],
            puts_near: vec![quote(100.0, 1000, 20, 0.5, 50.0), quote(85.0, 10, 0, 0.5, 1.0)],
            calls_target: vec![quote(100.0, 1000, 20, 0.5, 1.0)],
            puts_target: vec![quote(100.0, 1000, 20, 0.5, 50.0)],
            ..base_snapshot()
        },
    ];

    for snapshot in &snapshots {
        let result = score_snapshot(snapshot);
        assert!((1..=10).contains(&result.score), "score {}", result.score);
    }
}

#[test]
fn components_are_finite_and_non_negative() {
    let snapshots = [
        base_snapshot(),
        balanced_pcr_snapshot(),
        MarketSnapshot {
            current_price: None,
            historical_closes: vec![0.0; 30],
            ..base_snapshot()
        },
    ];

    for snapshot in &snapshots {
        let c = &score_snapshot(snapshot).components;
        for v in [
            c.volume_oi_ratio,
            c.put_call_ratio,
            c.iv_vs_historical,
            c.skew_analysis,
        ] {
            assert!(v.is_finite() && v >= 0.0, "component {v}");
        }
    }
}

#[test]
fn vol_oi_score_is_monotone_in_average_ratio() {
    // Increasing the lone chain's ratio never decreases the component,
    // and it saturates at 2.
    let mut last = -1.0;
    for volume in [20u64, 40, 80, 160, 320, 640] {
        let snapshot = MarketSnapshot {
            calls_near: vec![quote(100.0, volume, 20, 0.3, 1.0)],
            ..base_snapshot()
        };
        let score = score_snapshot(&snapshot).components.volume_oi_ratio;
        assert!(score >= last);
        assert!(score <= 2.0);
        last = score;
    }
    assert_eq!(last, 2.0);
}
