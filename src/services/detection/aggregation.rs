// Aggregation Logic
// Rolls reconciled sentence scores up into a document-level summary

use crate::models::{DetectionSummary, RiskLevel, SentenceScore};
use serde_json::Value;
use tracing::warn;

/// Weight of a mid-risk sentence relative to a high-risk one in the fallback
/// overall ratio.
const MID_WEIGHT: f64 = 0.5;

/// Count sentences per risk bucket and compute the overall ratio.
///
/// The oracle's own `overall_ratio` wins when it is numerically usable
/// (clamped into [0,1]); otherwise the ratio is `(high + 0.5*mid) / total`,
/// or 0.0 for an empty score set.
pub fn summarize(scores: &[SentenceScore], oracle_overall: Option<&Value>) -> DetectionSummary {
    let total_sentences = scores.len();
    let mut low_count = 0usize;
    let mut mid_count = 0usize;
    let mut high_count = 0usize;

    for score in scores {
        match score.level {
            RiskLevel::Low => low_count += 1,
            RiskLevel::Mid => mid_count += 1,
            RiskLevel::High => high_count += 1,
        }
    }

    let overall_ratio = match oracle_overall.and_then(value_as_f64) {
        Some(ratio) => {
            if !(0.0..=1.0).contains(&ratio) {
                warn!("[AGGREGATION] oracle overall_ratio {ratio} outside [0,1], clamping");
            }
            ratio.clamp(0.0, 1.0)
        }
        None => {
            if oracle_overall.is_some() {
                warn!("[AGGREGATION] non-numeric oracle overall_ratio, using fallback formula");
            }
            if total_sentences == 0 {
                0.0
            } else {
                (high_count as f64 + MID_WEIGHT * mid_count as f64) / total_sentences as f64
            }
        }
    };

    DetectionSummary {
        total_sentences,
        overall_ratio,
        low_count,
        mid_count,
        high_count,
    }
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn score(level: RiskLevel) -> SentenceScore {
        SentenceScore {
            index: 1,
            text: "测试句子文本".to_string(),
            score: 0.5,
            level,
            reason: None,
        }
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[], None);
        assert_eq!(summary.total_sentences, 0);
        assert_eq!(summary.overall_ratio, 0.0);
        assert_eq!(summary.low_count + summary.mid_count + summary.high_count, 0);
    }

    #[test]
    fn test_fallback_formula_two_high_two_low() {
        let scores = vec![
            score(RiskLevel::High),
            score(RiskLevel::High),
            score(RiskLevel::Low),
            score(RiskLevel::Low),
        ];
        let summary = summarize(&scores, None);
        assert_eq!(summary.overall_ratio, 0.5);
        assert_eq!(summary.high_count, 2);
        assert_eq!(summary.low_count, 2);
        assert_eq!(summary.mid_count, 0);
    }

    #[test]
    fn test_fallback_formula_weights_mid_half() {
        let scores = vec![
            score(RiskLevel::Mid),
            score(RiskLevel::Mid),
            score(RiskLevel::Low),
            score(RiskLevel::Low),
        ];
        let summary = summarize(&scores, None);
        assert_eq!(summary.overall_ratio, 0.25);
    }

    #[test]
    fn test_oracle_ratio_wins_over_formula() {
        let scores = vec![score(RiskLevel::High)];
        let oracle = json!(0.2);
        let summary = summarize(&scores, Some(&oracle));
        assert_eq!(summary.overall_ratio, 0.2);
    }

    #[test]
    fn test_oracle_ratio_numeric_string_accepted() {
        let oracle = json!("0.65");
        let summary = summarize(&[score(RiskLevel::Low)], Some(&oracle));
        assert_eq!(summary.overall_ratio, 0.65);
    }

    #[test]
    fn test_oracle_ratio_out_of_range_clamped() {
        let oracle = json!(1.8);
        let summary = summarize(&[score(RiskLevel::Low)], Some(&oracle));
        assert_eq!(summary.overall_ratio, 1.0);
    }

    #[test]
    fn test_non_numeric_oracle_ratio_falls_back() {
        let oracle = json!({"oops": true});
        let scores = vec![score(RiskLevel::High), score(RiskLevel::Low)];
        let summary = summarize(&scores, Some(&oracle));
        assert_eq!(summary.overall_ratio, 0.5);
    }

    #[test]
    fn test_bucket_counts_always_sum_to_total() {
        let scores = vec![
            score(RiskLevel::Low),
            score(RiskLevel::Mid),
            score(RiskLevel::High),
            score(RiskLevel::Mid),
            score(RiskLevel::Low),
        ];
        let summary = summarize(&scores, None);
        assert_eq!(
            summary.low_count + summary.mid_count + summary.high_count,
            summary.total_sentences
        );
        assert!(summary.overall_ratio >= 0.0 && summary.overall_ratio <= 1.0);
    }
}
