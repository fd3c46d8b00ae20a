// Detection Pipeline Orchestrator
// segment -> (short-circuit) -> oracle -> reconcile -> summarize

use crate::models::{DetectionRequest, DetectionResult, DetectionSummary};
use crate::services::oracle::{OracleError, ScoringOracle};
use crate::services::segmenter::split_text;
use thiserror::Error;
use tracing::{debug, info};

use super::aggregation::summarize;
use super::reconcile::reconcile;

/// Language tag sent to the oracle. Language detection is out of scope; the
/// scorer handles mixed Chinese/English input under the "zh" tag.
const DETECTION_LANGUAGE: &str = "zh";

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("scoring oracle failed: {0}")]
    Oracle(#[from] OracleError),
    #[error("oracle response violates schema: {0}")]
    SchemaViolation(String),
}

/// Run the full detection pipeline for one request.
///
/// Zero segmenter units short-circuit to an all-zero summary without
/// contacting the oracle. Otherwise the oracle is called exactly once and its
/// reply is reconciled and summarized. All-or-nothing: any oracle or schema
/// failure aborts the request with no partial result.
pub async fn run_detection<O: ScoringOracle>(
    oracle: &O,
    request: DetectionRequest,
) -> Result<DetectionResult, DetectError> {
    let units = split_text(&request.text);
    debug!(
        "[DETECTOR] segmented {} chars into {} units",
        request.text.chars().count(),
        units.len()
    );

    if units.is_empty() {
        return Ok(DetectionResult {
            request,
            summary: DetectionSummary::empty(),
            sentences: Vec::new(),
        });
    }

    let reply = oracle
        .score(&units, request.target_ratio, DETECTION_LANGUAGE)
        .await?;

    let outcome = reconcile(&units, &reply)?;
    if outcome.defaulted_fields > 0 {
        info!(
            "[DETECTOR] oracle reply needed {} field defaults across {} entries",
            outcome.defaulted_fields,
            outcome.scores.len()
        );
    }

    let summary = summarize(&outcome.scores, reply.overall_ratio.as_ref());

    Ok(DetectionResult {
        request,
        summary,
        sentences: outcome.scores,
    })
}
