// Reconciliation Logic
// Coerces the untrusted oracle reply into validated per-sentence records

use crate::models::{RiskLevel, SentenceScore};
use crate::services::oracle::OracleReply;
use serde_json::Value;
use tracing::warn;

use super::detector::DetectError;

/// Result of the defensive merge. `defaulted_fields` counts every field that
/// had to be defaulted, substituted, or clamped, so a lenient-but-broken
/// oracle contract stays visible to callers.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub scores: Vec<SentenceScore>,
    pub defaulted_fields: usize,
}

/// Walk the oracle's sentence entries in their given order and coerce each
/// into a `SentenceScore`.
///
/// The oracle is untrusted: it may reorder, omit, or duplicate entries, and
/// field types are best-effort only. The original segmenter units serve as a
/// positional text fallback, never to overrule an oracle-supplied value.
/// Entries that are not objects, or that carry a `level` outside the closed
/// enum, fail the whole reconciliation.
pub fn reconcile(units: &[String], reply: &OracleReply) -> Result<ReconcileOutcome, DetectError> {
    let mut scores = Vec::with_capacity(reply.sentences.len());
    let mut defaulted_fields = 0usize;

    for (pos, entry) in reply.sentences.iter().enumerate() {
        let i = pos as i64 + 1; // 1-based position within the oracle array

        let obj = entry.as_object().ok_or_else(|| {
            DetectError::SchemaViolation(format!("sentence entry {i} is not an object"))
        })?;

        let index = match obj.get("index").and_then(coerce_i64) {
            Some(idx) if idx >= 1 => idx,
            _ => {
                warn!("[RECONCILE] entry {i}: missing or unusable index, using position");
                defaulted_fields += 1;
                i
            }
        };

        let text = match obj.get("text").and_then(Value::as_str) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => {
                defaulted_fields += 1;
                let fallback = units
                    .get(pos)
                    .cloned()
                    .unwrap_or_default();
                warn!(
                    "[RECONCILE] entry {i}: missing text, falling back to unit ({} chars)",
                    fallback.chars().count()
                );
                fallback
            }
        };

        let score = match obj.get("score").and_then(coerce_f64) {
            Some(s) if (0.0..=1.0).contains(&s) => s,
            Some(s) => {
                warn!("[RECONCILE] entry {i}: score {s} outside [0,1], clamping");
                defaulted_fields += 1;
                s.clamp(0.0, 1.0)
            }
            None => {
                warn!("[RECONCILE] entry {i}: missing or non-coercible score, using 0.0");
                defaulted_fields += 1;
                0.0
            }
        };

        let level = match obj.get("level") {
            None | Some(Value::Null) => {
                warn!("[RECONCILE] entry {i}: missing level, defaulting to low");
                defaulted_fields += 1;
                RiskLevel::Low
            }
            Some(Value::String(s)) => RiskLevel::parse(s).ok_or_else(|| {
                DetectError::SchemaViolation(format!("entry {i}: unknown risk level {s:?}"))
            })?,
            Some(other) => {
                return Err(DetectError::SchemaViolation(format!(
                    "entry {i}: level is not a string: {other}"
                )))
            }
        };

        let reason = obj
            .get("reason")
            .and_then(Value::as_str)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        scores.push(SentenceScore {
            index,
            text,
            score,
            level,
            reason,
        });
    }

    Ok(ReconcileOutcome {
        scores,
        defaulted_fields,
    })
}

/// Best-effort integer coercion: integer, truncated finite float, or numeric
/// string.
fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Best-effort float coercion: number or numeric string.
fn coerce_f64(value: &Value) -> Option<f64> {
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

    fn units(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    fn reply_with(sentences: Vec<Value>) -> OracleReply {
        OracleReply {
            overall_ratio: None,
            sentences,
        }
    }

    #[test]
    fn test_well_formed_reply_keeps_everything() {
        let reply = reply_with(vec![
            json!({"index": 1, "text": "第一句内容", "score": 0.9, "level": "high", "reason": "模板化表达"}),
            json!({"index": 2, "text": "第二句内容", "score": 0.1, "level": "low"}),
        ]);
        let outcome = reconcile(&units(&["第一句内容", "第二句内容"]), &reply).unwrap();

        assert_eq!(outcome.defaulted_fields, 0);
        assert_eq!(outcome.scores.len(), 2);
        assert_eq!(outcome.scores[0].level, RiskLevel::High);
        assert_eq!(outcome.scores[0].reason.as_deref(), Some("模板化表达"));
        assert_eq!(outcome.scores[1].index, 2);
        assert!(outcome.scores[1].reason.is_none());
    }

    #[test]
    fn test_missing_fields_default_positionally() {
        let reply = reply_with(vec![json!({})]);
        let outcome = reconcile(&units(&["原始句子文本"]), &reply).unwrap();

        let s = &outcome.scores[0];
        assert_eq!(s.index, 1);
        assert_eq!(s.text, "原始句子文本");
        assert_eq!(s.score, 0.0);
        assert_eq!(s.level, RiskLevel::Low);
        // index, text, score, level all defaulted.
        assert_eq!(outcome.defaulted_fields, 4);
    }

    #[test]
    fn test_text_fallback_beyond_units_is_empty() {
        let reply = reply_with(vec![json!({"score": 0.5, "level": "mid"}), json!({"level": "mid"})]);
        let outcome = reconcile(&units(&["仅有一个原始单元"]), &reply).unwrap();

        assert_eq!(outcome.scores[0].text, "仅有一个原始单元");
        assert_eq!(outcome.scores[1].text, "");
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let reply = reply_with(vec![
            json!({"index": "3", "text": "句子文本在这里", "score": "0.75", "level": "mid"}),
        ]);
        let outcome = reconcile(&[], &reply).unwrap();

        assert_eq!(outcome.scores[0].index, 3);
        assert_eq!(outcome.scores[0].score, 0.75);
        assert_eq!(outcome.defaulted_fields, 0);
    }

    #[test]
    fn test_float_index_truncates() {
        let reply = reply_with(vec![json!({"index": 2.9, "text": "句子文本在这里", "score": 0.2, "level": "low"})]);
        let outcome = reconcile(&[], &reply).unwrap();
        assert_eq!(outcome.scores[0].index, 2);
    }

    #[test]
    fn test_out_of_range_index_uses_position() {
        let reply = reply_with(vec![json!({"index": 0, "text": "句子文本在这里", "score": 0.2, "level": "low"})]);
        let outcome = reconcile(&[], &reply).unwrap();
        assert_eq!(outcome.scores[0].index, 1);
        assert_eq!(outcome.defaulted_fields, 1);
    }

    #[test]
    fn test_score_outside_range_is_clamped() {
        let reply = reply_with(vec![
            json!({"index": 1, "text": "句子文本在这里", "score": 1.7, "level": "high"}),
            json!({"index": 2, "text": "另一个句子文本", "score": -0.4, "level": "low"}),
        ]);
        let outcome = reconcile(&[], &reply).unwrap();
        assert_eq!(outcome.scores[0].score, 1.0);
        assert_eq!(outcome.scores[1].score, 0.0);
        assert_eq!(outcome.defaulted_fields, 2);
    }

    #[test]
    fn test_unknown_level_is_schema_violation() {
        let reply = reply_with(vec![json!({"index": 1, "text": "句子文本在这里", "score": 0.5, "level": "medium"})]);
        let err = reconcile(&[], &reply).unwrap_err();
        assert!(matches!(err, DetectError::SchemaViolation(_)));
    }

    #[test]
    fn test_non_string_level_is_schema_violation() {
        let reply = reply_with(vec![json!({"index": 1, "text": "句子文本在这里", "score": 0.5, "level": 2})]);
        let err = reconcile(&[], &reply).unwrap_err();
        assert!(matches!(err, DetectError::SchemaViolation(_)));
    }

    #[test]
    fn test_non_object_entry_is_schema_violation() {
        let reply = reply_with(vec![json!("not an object")]);
        let err = reconcile(&[], &reply).unwrap_err();
        assert!(matches!(err, DetectError::SchemaViolation(_)));
    }

    #[test]
    fn test_oracle_order_and_duplicates_preserved() {
        // The oracle reordered and duplicated entries; reconciliation keeps
        // its order and its index values.
        let reply = reply_with(vec![
            json!({"index": 2, "text": "第二句内容", "score": 0.3, "level": "low"}),
            json!({"index": 1, "text": "第一句内容", "score": 0.8, "level": "high"}),
            json!({"index": 1, "text": "第一句内容", "score": 0.8, "level": "high"}),
        ]);
        let outcome = reconcile(&units(&["第一句内容", "第二句内容"]), &reply).unwrap();
        let indices: Vec<i64> = outcome.scores.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![2, 1, 1]);
    }

    #[test]
    fn test_empty_reason_is_dropped() {
        let reply = reply_with(vec![json!({"index": 1, "text": "句子文本在这里", "score": 0.5, "level": "mid", "reason": ""})]);
        let outcome = reconcile(&[], &reply).unwrap();
        assert!(outcome.scores[0].reason.is_none());
    }
}
