//! Turns a score result into the ordered list of human-readable findings
//! served alongside it. Purely advisory text; thresholds operate on the
//! rounded component scores exactly as serialized.

use crate::model::score::ScoreResult;

pub fn interpret(result: &ScoreResult) -> Vec<String> {
    let mut findings = Vec::new();
    let score = result.score;

    findings.push(if score <= 3 {
        format!("Score {score}/10: Options activity appears normal.")
    } else if score <= 6 {
        format!("Score {score}/10: Options show somewhat unusual activity.")
    } else {
        format!("Score {score}/10: Options show highly unusual activity!")
    });

    if result.components.volume_oi_ratio > 1.5 {
        findings.push(
            "• High volume relative to open interest suggests unusual trading activity."
                .to_string(),
        );
    }

    if result.components.put_call_ratio > 2.0 {
        let pcr_raw = result.raw_data.pcr_near;
        if pcr_raw > 1.5 {
            findings.push(
                "• Put-Call ratio is unusually high, suggesting bearish sentiment or hedging."
                    .to_string(),
            );
        } else if pcr_raw < 0.4 {
            findings.push(
                "• Put-Call ratio is unusually low, suggesting extreme bullish sentiment."
                    .to_string(),
            );
        }
    }

    if result.components.iv_vs_historical > 2.0 {
        findings.push(
            "• Implied volatility is significantly different from historical volatility, \
             suggesting unusual expectations."
                .to_string(),
        );
    }

    if result.components.skew_analysis > 1.5 {
        findings.push(
            "• Options skew is unusual, indicating asymmetric expectations for price movement."
                .to_string(),
        );
    }

    findings
}
