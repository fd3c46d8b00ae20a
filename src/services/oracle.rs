// Scoring Oracle Service
// DeepSeek-backed sentence originality scoring behind a substitution seam

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

pub const DEEPSEEK_DEFAULT_URL: &str = "https://api.deepseek.com/chat/completions";
pub const DEEPSEEK_DEFAULT_MODEL: &str = "deepseek-chat";

const DEFAULT_TIMEOUT_SECS: u64 = 80;
const DEFAULT_MAX_TOKENS: i32 = 4096;

/// System prompt for sentence-level originality scoring.
/// The oracle must answer with a single JSON object and nothing else.
const SCORING_SYSTEM_PROMPT: &str = r#"你是一个“学术文本原创性分析器”。
输入是一个 JSON，包含 target_ratio, language, sentences（句子数组）。
输出必须是一个合法 JSON，结构为：
{ "overall_ratio": <float 0~1>, "sentences": [ { "index": <int 从 1 开始>, "text": "<原句文本>", "score": <float 0~1>, "level": "<low|mid|high>", "reason": "<可选简短中文说明>" } ] }。
只输出 JSON，不要解释，不要代码块。"#;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("missing content in response")]
    MissingContent,
    #[error("JSON parse error: {0}")]
    Json(String),
    #[error("API key not configured")]
    MissingApiKey,
}

/// Loosely-typed oracle reply. The reconciler is the only component allowed
/// to interpret these values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OracleReply {
    #[serde(default)]
    pub overall_ratio: Option<Value>,
    #[serde(default)]
    pub sentences: Vec<Value>,
}

/// The seam between the pipeline and the external scorer. Implementations
/// block (asynchronously) until a full reply or a failure; the pipeline calls
/// this at most once per detection request.
pub trait ScoringOracle {
    fn score(
        &self,
        sentences: &[String],
        target_ratio: f64,
        language: &str,
    ) -> impl Future<Output = Result<OracleReply, OracleError>> + Send;
}

// ============ DeepSeek client ============

#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_tokens: i32,
}

impl OracleConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEEPSEEK_DEFAULT_URL.to_string(),
            model: DEEPSEEK_DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: i32,
    temperature: f64,
    response_format: ResponseFormat,
}

#[derive(Debug, Clone, Serialize)]
struct ResponseFormat {
    r#type: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageResponse>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

/// Payload the oracle receives as the user message.
#[derive(Debug, Serialize)]
struct ScoringPayload<'a> {
    target_ratio: f64,
    language: &'a str,
    sentences: &'a [String],
}

#[derive(Debug)]
pub struct DeepSeekOracle {
    client: Client,
    config: OracleConfig,
}

impl DeepSeekOracle {
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        if config.api_key.trim().is_empty() {
            return Err(OracleError::MissingApiKey);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    async fn call_chat_api(&self, system: &str, user: &str) -> Result<String, OracleError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: 0.0,
            // Prompt contains 'json', so json_object format is accepted.
            response_format: ResponseFormat {
                r#type: "json_object".to_string(),
            },
        };

        let start = Instant::now();

        let response = self
            .client
            .post(&self.config.base_url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let latency_ms = start.elapsed().as_millis() as i64;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                "[ORACLE] DeepSeek error model={} status={} latency_ms={}",
                self.config.model, status, latency_ms
            );
            return Err(OracleError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Json(e.to_string()))?;

        let content = data
            .choices
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or(OracleError::MissingContent)?;

        info!(
            "[ORACLE] DeepSeek ok model={} latency_ms={} content_len={}",
            self.config.model,
            latency_ms,
            content.len()
        );
        Ok(content)
    }
}

impl ScoringOracle for DeepSeekOracle {
    async fn score(
        &self,
        sentences: &[String],
        target_ratio: f64,
        language: &str,
    ) -> Result<OracleReply, OracleError> {
        let payload = ScoringPayload {
            target_ratio,
            language,
            sentences,
        };
        let user = serde_json::to_string(&payload).map_err(|e| OracleError::Json(e.to_string()))?;

        let content = self.call_chat_api(SCORING_SYSTEM_PROMPT, &user).await?;
        parse_oracle_reply(&content)
    }
}

/// Extract the outermost JSON object from response content. Models sometimes
/// wrap the object in prose or code fences despite the prompt.
fn extract_json(content: &str) -> Result<&str, OracleError> {
    let trimmed = content.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Ok(trimmed);
    }
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&trimmed[start..=end]),
        _ => Err(OracleError::Json("no JSON object in response".to_string())),
    }
}

/// Parse raw oracle content into the loose reply structure. Content that is
/// not a JSON object fails here; field-level interpretation is deferred to
/// the reconciler.
pub fn parse_oracle_reply(content: &str) -> Result<OracleReply, OracleError> {
    let json_str = extract_json(content)?;
    serde_json::from_str::<OracleReply>(json_str).map_err(|e| OracleError::Json(e.to_string()))
}
