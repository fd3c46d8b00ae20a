// aigcheck CLI
// Detect AIGC risk for a text snippet or a document file

use aigcheck_lib::services::config_store::{resolve_api_key, ConfigStore};
use aigcheck_lib::services::extract::extract_text;
use aigcheck_lib::{init_logging, run_detection, DeepSeekOracle, DetectionRequest, OracleConfig};
use anyhow::{anyhow, Context, Result};
use std::path::Path;
use tracing::info;
use uuid::Uuid;

const USAGE: &str = "Usage:\n  aigcheck --text <text> [--target-ratio <f>] [--json <out_path>]\n  aigcheck --file <path.txt|.docx|.pdf> [--target-ratio <f>] [--json <out_path>]\n\nNotes:\n  - API key 从环境变量 DEEPSEEK_API_KEY（或 AIGCHECK_DEEPSEEK_API_KEY）读取，\n    也可存入配置文件（config.json 的 apiKeys.deepseek）。\n  - 默认 target ratio 取配置文件的 detection.targetRatio（缺省 0.3）。";

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("{USAGE}");
        std::process::exit(1);
    }

    let config = match ConfigStore::default_config_dir() {
        Some(dir) => ConfigStore::new(dir).load().map_err(|e| anyhow!(e))?,
        None => Default::default(),
    };

    let input_text = match parse_arg_value(&args, "--text") {
        Some(text) => text,
        None => match parse_arg_value(&args, "--file") {
            Some(path) => extract_text(Path::new(&path))
                .with_context(|| format!("failed to extract text from {path}"))?,
            None => {
                eprintln!("{USAGE}");
                std::process::exit(1);
            }
        },
    };

    let target_ratio = parse_arg_value(&args, "--target-ratio")
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(config.detection.target_ratio);
    let json_out = parse_arg_value(&args, "--json");

    let api_key = resolve_api_key("deepseek")
        .ok_or_else(|| anyhow!("DeepSeek API key 未配置：请设置 DEEPSEEK_API_KEY 或写入配置文件"))?;

    let mut oracle_config = OracleConfig::new(api_key);
    oracle_config.base_url = config.oracle.base_url.clone();
    oracle_config.model = config.oracle.model.clone();
    oracle_config.timeout_secs = config.oracle.timeout_secs;
    let oracle = DeepSeekOracle::new(oracle_config)?;

    let request_id = Uuid::new_v4();
    let request = DetectionRequest::new(input_text, target_ratio);
    info!(
        "[CLI] request_id={} chars={} target_ratio={}",
        request_id,
        request.text.chars().count(),
        target_ratio
    );

    let result = run_detection(&oracle, request).await?;

    let summary = &result.summary;
    println!(
        "Summary: total={}, overall_ratio={:.3}, low={}, mid={}, high={}",
        summary.total_sentences,
        summary.overall_ratio,
        summary.low_count,
        summary.mid_count,
        summary.high_count
    );

    for s in result.sentences.iter().take(10) {
        println!(
            "[{}] level={} score={:.3} text={}",
            s.index,
            s.level.as_str().to_uppercase(),
            s.score,
            truncate_chars(&s.text, 80)
        );
    }
    if result.sentences.len() > 10 {
        println!("... ({} more sentences)", result.sentences.len() - 10);
    }

    if let Some(out_path) = json_out {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(&out_path, json)
            .with_context(|| format!("failed to write {out_path}"))?;
        println!();
        println!("Wrote JSON: {out_path}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arg_value() {
        let args: Vec<String> = ["aigcheck", "--text", "hello", "--target-ratio", "0.5"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(parse_arg_value(&args, "--text").as_deref(), Some("hello"));
        assert_eq!(parse_arg_value(&args, "--target-ratio").as_deref(), Some("0.5"));
        assert_eq!(parse_arg_value(&args, "--file"), None);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 80), "short");
        let long = "很".repeat(100);
        let out = truncate_chars(&long, 80);
        assert_eq!(out.chars().count(), 80);
        assert!(out.ends_with("..."));
    }
}
