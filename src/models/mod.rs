// aigcheck Data Models
// Migrated from Python Pydantic schemas

use serde::{Deserialize, Serialize};

// ============ Risk Level ============

/// Qualitative AIGC risk judgment for a single sentence unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Mid,
    High,
}

impl RiskLevel {
    /// Parse a wire-level risk string. Anything outside the closed enum is rejected.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "mid" => Some(Self::Mid),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Mid => "mid",
            Self::High => "high",
        }
    }
}

// ============ Detection Request ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Summary,
    Detail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionRequest {
    pub text: String,
    /// Caller's expected AI-content threshold. Passed through to the oracle,
    /// not enforced by the pipeline.
    #[serde(default = "default_target_ratio")]
    pub target_ratio: f64,
    /// Opaque style tag forwarded for oracle context.
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default = "default_detail_level")]
    pub detail_level: DetailLevel,
}

impl DetectionRequest {
    pub fn new(text: impl Into<String>, target_ratio: f64) -> Self {
        Self {
            text: text.into(),
            target_ratio,
            style: default_style(),
            detail_level: default_detail_level(),
        }
    }
}

// ============ Sentence Score ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceScore {
    /// 1-based position in the reconciled sequence.
    pub index: i64,
    pub text: String,
    /// Clamped into [0, 1] during reconciliation.
    pub score: f64,
    pub level: RiskLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// ============ Detection Summary ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionSummary {
    pub total_sentences: usize,
    pub overall_ratio: f64,
    pub low_count: usize,
    pub mid_count: usize,
    pub high_count: usize,
}

impl DetectionSummary {
    /// Summary for a document that produced no scorable units.
    pub fn empty() -> Self {
        Self {
            total_sentences: 0,
            overall_ratio: 0.0,
            low_count: 0,
            mid_count: 0,
            high_count: 0,
        }
    }
}

// ============ Detection Result ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub request: DetectionRequest,
    pub summary: DetectionSummary,
    pub sentences: Vec<SentenceScore>,
}

// ============ Default Value Functions ============

fn default_target_ratio() -> f64 { 0.3 }
fn default_style() -> String { "style_a".to_string() }
fn default_detail_level() -> DetailLevel { DetailLevel::Summary }
