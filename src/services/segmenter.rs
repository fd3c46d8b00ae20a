// Sentence Segmenter
// Splits mixed Chinese/English text into scorable sentence units

use regex::Regex;
use std::sync::OnceLock;

/// Fragments shorter than this (Unicode scalar count, not UTF-8 byte length)
/// are punctuation debris or abbreviation shards, not scorable units.
const MIN_UNIT_CHARS: usize = 5;

fn delimiter_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Sentence-terminal punctuation (CJK and Latin) plus newlines.
    // A run of delimiters is a single split point.
    RE.get_or_init(|| Regex::new(r"[。！？.!?\n]+").unwrap())
}

/// Split text into ordered sentence units.
///
/// Fragments are trimmed; fragments with fewer than 5 chars are discarded.
/// If nothing survives but the trimmed input is non-empty, the whole trimmed
/// input becomes the single unit. Empty or whitespace-only input yields an
/// empty vec.
pub fn split_text(text: &str) -> Vec<String> {
    let units: Vec<String> = delimiter_regex()
        .split(text)
        .map(str::trim)
        .filter(|part| part.chars().count() >= MIN_UNIT_CHARS)
        .map(str::to_string)
        .collect();

    let trimmed = text.trim();
    if units.is_empty() && !trimmed.is_empty() {
        return vec![trimmed.to_string()];
    }
    units
}
