//! Heuristic keyword extraction for the `query_string` retriever.
//!
//! Used whenever a search request is built without the LLM: direct mode and
//! the fallback after an unusable LLM response.

use regex::Regex;
use std::sync::LazyLock;

/// Portuguese function words dropped from keyword queries.
pub const STOP_WORDS: [&str; 31] = [
    "o", "a", "os", "as", "de", "da", "do", "das", "dos", "em", "na", "no", "nas", "nos", "por",
    "para", "como", "que", "se", "e", "ou", "é", "são", "um", "uma", "uns", "umas", "ao", "aos",
    "pelo", "pela",
];

static NON_WORD: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[^\w\s]").ok());

/// Minimum length (in characters) for a token to count as a keyword.
const MIN_KEYWORD_CHARS: usize = 3;

/// Number of leading tokens used when every token is filtered out.
const FALLBACK_TOKENS: usize = 3;

/// Build a boolean keyword expression such as `(sono) OR (meditação)`.
///
/// The question is lower-cased and punctuation becomes whitespace. Stop
/// words and tokens shorter than three characters are dropped. If nothing
/// survives, the first three original tokens longer than two characters are
/// used instead, and if that is still empty the question itself is returned.
/// The result is deterministic and only empty for an empty question.
pub fn extract_keywords(query: &str) -> String {
    let lowered = query.to_lowercase();
    let cleaned = strip_punctuation(&lowered);

    let keywords: Vec<&str> = cleaned
        .split_whitespace()
        .filter(|token| !STOP_WORDS.contains(token))
        .filter(|token| token.chars().count() >= MIN_KEYWORD_CHARS)
        .collect();

    if !keywords.is_empty() {
        return join_keywords(&keywords);
    }

    let leading: Vec<&str> = query
        .split_whitespace()
        .take(FALLBACK_TOKENS)
        .filter(|token| token.chars().count() >= MIN_KEYWORD_CHARS)
        .collect();

    if !leading.is_empty() {
        tracing::debug!("No keywords survived filtering, using leading tokens");
        return join_keywords(&leading);
    }

    query.to_string()
}

fn strip_punctuation(text: &str) -> String {
    match NON_WORD.as_ref() {
        Some(re) => re.replace_all(text, " ").into_owned(),
        None => {
            tracing::warn!("Punctuation pattern unavailable, keeping text as is");
            text.to_string()
        }
    }
}

fn join_keywords(keywords: &[&str]) -> String {
    keywords
        .iter()
        .map(|k| format!("({})", k))
        .collect::<Vec<_>>()
        .join(" OR ")
}
