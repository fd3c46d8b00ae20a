// File Text Extraction
// Pulls plain text out of .docx / .pdf / UTF-8 files for the CLI --file path

use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("file is not valid UTF-8 text: {0}")]
    NotText(String),
    #[error("docx parse failed: {0}")]
    Docx(String),
    #[error("pdf extraction failed: {0}")]
    Pdf(String),
}

/// Extract text from a file based on its extension. Unknown extensions are
/// treated as UTF-8 plain text.
pub fn extract_text(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path).map_err(|e| ExtractError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    let text = match ext.as_str() {
        "docx" => extract_docx(&bytes)?,
        "pdf" => extract_pdf(&bytes)?,
        _ => String::from_utf8(bytes)
            .map_err(|_| ExtractError::NotText(path.display().to_string()))?,
    };

    info!(
        "[EXTRACT] {} -> {} chars",
        path.display(),
        text.chars().count()
    );
    Ok(text)
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| ExtractError::Docx(e.to_string()))?;

    let mut out = String::new();
    for child in &docx.document.children {
        if let DocumentChild::Paragraph(para) = child {
            let mut line = String::new();
            for pc in &para.children {
                if let ParagraphChild::Run(run) = pc {
                    for rc in &run.children {
                        if let RunChild::Text(t) = rc {
                            line.push_str(&t.text);
                        }
                    }
                }
            }
            if !line.trim().is_empty() {
                out.push_str(line.trim());
                out.push('\n');
            }
        }
    }
    Ok(out)
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}
