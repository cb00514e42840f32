//! The unusualness scoring engine: a pure function from a market snapshot to
//! a bounded 1–10 score with its component breakdown.
//!
//! Each of the four sub-scores is computed independently and degrades to a
//! documented default instead of failing; the aggregation clamps the rounded
//! sum into 1..=10. The engine never returns an error.

use tracing::debug;

use crate::model::quote::OptionQuote;
use crate::model::score::{
    ComponentScores, FallbackNote, FallbackReason, RawDiagnostics, ScoreResult, SubScore,
};
use crate::model::snapshot::MarketSnapshot;

/// Quotes with open interest at or below this are ignored for vol/OI ratios.
const MIN_OPEN_INTEREST: u64 = 10;
/// Per-quote volume/open-interest ratios are clamped to this ceiling.
const VOL_OI_CAP: f64 = 20.0;
/// Typical dollar-weighted put/call ratio; deviation in either direction scores.
const PCR_ANCHOR: f64 = 0.7;
/// PCR when the call side traded no value at all.
const PCR_NO_CALL_VALUE: f64 = 5.0;
/// PCR default when the computation degenerates.
const PCR_DEFAULT: f64 = 1.0;
/// Implied vol "normally" runs ~15% above realized vol.
const IV_HV_ANCHOR: f64 = 1.15;
/// OTM puts "normally" carry ~20% more IV than OTM calls.
const SKEW_ANCHOR: f64 = 1.2;
/// Minimum daily closes required for the historical-volatility leg.
const MIN_HISTORY: usize = 20;
/// Strikes within ±5% of spot count as at-the-money.
const ATM_BAND: f64 = 0.05;
const TRADING_DAYS: f64 = 252.0;

/// Score one snapshot. Total pipeline failure (a non-finite sum, which no
/// valid input produces) yields the all-zero floor result instead of an error.
pub fn score_snapshot(snapshot: &MarketSnapshot) -> ScoreResult {
    let (vol_oi, avg_vol_oi) = volume_oi_score(snapshot);
    let (pcr, pcr_near, pcr_target) = pcr_score(snapshot);
    let iv_hv = iv_vs_historical_score(snapshot);
    let skew = skew_score(snapshot);

    let total = vol_oi.value() + pcr.value() + iv_hv.value() + skew.value();
    if !total.is_finite() {
        debug!(ticker = %snapshot.ticker, "score total degenerated, returning floor result");
        return ScoreResult::degraded();
    }

    let mut fallbacks = Vec::new();
    for (component, sub) in [
        ("volume_oi_ratio", &vol_oi),
        ("put_call_ratio", &pcr),
        ("iv_vs_historical", &iv_hv),
        ("skew_analysis", &skew),
    ] {
        if let Some(reason) = sub.fallback_reason() {
            debug!(ticker = %snapshot.ticker, component, ?reason, "sub-score fell back to default");
            fallbacks.push(FallbackNote {
                component: component.to_string(),
                reason,
            });
        }
    }

    ScoreResult {
        score: total.round().clamp(1.0, 10.0) as u8,
        components: ComponentScores {
            volume_oi_ratio: round2(vol_oi.value()),
            put_call_ratio: round2(pcr.value()),
            iv_vs_historical: round2(iv_hv.value()),
            skew_analysis: round2(skew.value()),
        },
        raw_data: RawDiagnostics {
            avg_vol_oi: round2(avg_vol_oi),
            pcr_near: round2(pcr_near),
            pcr_target: round2(pcr_target),
        },
        fallbacks,
    }
}

// ── Volume / open interest ──────────────────────────────────────────

/// Mean clamped volume/OI ratio over quotes with meaningful open interest;
/// 0 when no quote qualifies.
fn chain_vol_oi_ratio(quotes: &[OptionQuote]) -> f64 {
    let ratios: Vec<f64> = quotes
        .iter()
        .filter(|q| q.open_interest > MIN_OPEN_INTEREST)
        .map(|q| (q.volume as f64 / q.open_interest as f64).min(VOL_OI_CAP))
        .collect();

    if ratios.is_empty() {
        return 0.0;
    }
    ratios.iter().sum::<f64>() / ratios.len() as f64
}

fn volume_oi_score(snapshot: &MarketSnapshot) -> (SubScore, f64) {
    let avg = [
        chain_vol_oi_ratio(&snapshot.calls_near),
        chain_vol_oi_ratio(&snapshot.puts_near),
        chain_vol_oi_ratio(&snapshot.calls_target),
        chain_vol_oi_ratio(&snapshot.puts_target),
    ]
    .iter()
    .sum::<f64>()
        / 4.0;

    if !avg.is_finite() {
        return (
            SubScore::Fallback {
                value: 0.0,
                reason: FallbackReason::NonFinite,
            },
            0.0,
        );
    }

    (SubScore::Computed((avg / 2.0).min(2.0)), avg)
}

// ── Put/call ratio ──────────────────────────────────────────────────

/// Dollar-weighted put/call ratio for one expiration pair. Returns the ratio
/// and whether it had to default.
fn pair_pcr(calls: &[OptionQuote], puts: &[OptionQuote]) -> (f64, bool) {
    let call_value: f64 = calls.iter().map(|q| q.volume as f64 * q.last_price).sum();
    let put_value: f64 = puts.iter().map(|q| q.volume as f64 * q.last_price).sum();

    if !call_value.is_finite() || !put_value.is_finite() {
        return (PCR_DEFAULT, true);
    }
    if call_value == 0.0 {
        return (PCR_NO_CALL_VALUE, false);
    }
    let pcr = put_value / call_value;
    if pcr.is_finite() { (pcr, false) } else { (PCR_DEFAULT, true) }
}

fn pcr_score(snapshot: &MarketSnapshot) -> (SubScore, f64, f64) {
    let (pcr_near, near_defaulted) = pair_pcr(&snapshot.calls_near, &snapshot.puts_near);
    let (pcr_target, target_defaulted) = pair_pcr(&snapshot.calls_target, &snapshot.puts_target);

    let score = (((pcr_near - PCR_ANCHOR).abs() * 1.5).min(2.0)
        + ((pcr_target - PCR_ANCHOR).abs() * 1.5).min(2.0))
    .min(3.0);

    let sub = if near_defaulted || target_defaulted {
        SubScore::Fallback {
            value: score,
            reason: FallbackReason::NonFinite,
        }
    } else {
        SubScore::Computed(score)
    };

    (sub, pcr_near, pcr_target)
}

// ── Implied vs historical volatility ────────────────────────────────

/// Annualized historical volatility (percent) from daily closes, using the
/// sample standard deviation of percent returns.
fn historical_volatility(closes: &[f64]) -> Option<f64> {
    let returns: Vec<f64> = closes
        .windows(2)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect();
    if returns.len() < 2 {
        return None;
    }

    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (returns.len() - 1) as f64;
    let hv = var.sqrt() * TRADING_DAYS.sqrt() * 100.0;
    hv.is_finite().then_some(hv)
}

fn mean_iv(quotes: &[&OptionQuote]) -> f64 {
    quotes.iter().map(|q| q.implied_volatility).sum::<f64>() / quotes.len() as f64
}

fn iv_vs_historical_score(snapshot: &MarketSnapshot) -> SubScore {
    if snapshot.historical_closes.len() < MIN_HISTORY {
        return SubScore::Fallback {
            value: 1.0,
            reason: FallbackReason::InsufficientHistory,
        };
    }

    let Some(price) = snapshot.current_price else {
        return SubScore::Fallback {
            value: 1.0,
            reason: FallbackReason::MissingPrice,
        };
    };

    let Some(hist_vol) = historical_volatility(&snapshot.historical_closes) else {
        return SubScore::Fallback {
            value: 1.0,
            reason: FallbackReason::NonFinite,
        };
    };

    let atm = |q: &&OptionQuote| {
        q.strike >= price * (1.0 - ATM_BAND) && q.strike <= price * (1.0 + ATM_BAND)
    };
    let atm_calls: Vec<&OptionQuote> = snapshot.calls_near.iter().filter(atm).collect();
    let atm_puts: Vec<&OptionQuote> = snapshot.puts_near.iter().filter(atm).collect();

    if atm_calls.is_empty() || atm_puts.is_empty() {
        return SubScore::Fallback {
            value: 1.5,
            reason: FallbackReason::NoAtmQuotes,
        };
    }

    let avg_iv = (mean_iv(&atm_calls) + mean_iv(&atm_puts)) / 2.0 * 100.0;
    let ratio = if hist_vol > 0.0 { avg_iv / hist_vol } else { 2.0 };
    if !ratio.is_finite() {
        return SubScore::Fallback {
            value: 1.0,
            reason: FallbackReason::NonFinite,
        };
    }

    SubScore::Computed(((ratio - IV_HV_ANCHOR).abs() * 3.0).min(3.0))
}

// ── Skew ────────────────────────────────────────────────────────────

fn skew_score(snapshot: &MarketSnapshot) -> SubScore {
    let Some(price) = snapshot.current_price else {
        return SubScore::Fallback {
            value: 1.0,
            reason: FallbackReason::MissingPrice,
        };
    };

    let otm_calls: Vec<&OptionQuote> = snapshot
        .calls_near
        .iter()
        .filter(|q| q.strike > price * 1.1)
        .collect();
    let otm_puts: Vec<&OptionQuote> = snapshot
        .puts_near
        .iter()
        .filter(|q| q.strike < price * 0.9)
        .collect();

    if otm_calls.is_empty() || otm_puts.is_empty() {
        return SubScore::Fallback {
            value: 1.0,
            reason: FallbackReason::EmptyOtmSide,
        };
    }

    let avg_call_iv = mean_iv(&otm_calls);
    let avg_put_iv = mean_iv(&otm_puts);

    if avg_call_iv == 0.0 {
        return SubScore::Computed(3.0);
    }
    let skew_ratio = avg_put_iv / avg_call_iv;
    if !skew_ratio.is_finite() {
        return SubScore::Fallback {
            value: 1.0,
            reason: FallbackReason::NonFinite,
        };
    }

    SubScore::Computed(((skew_ratio - SKEW_ANCHOR).abs() * 3.0).min(2.0))
}

pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
