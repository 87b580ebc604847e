//! Message tokenizer.
//!
//! Crisis messages arrive with URLs, phone numbers, punctuation runs and
//! inconsistent casing. Tokenization strips everything that is not a letter
//! or digit, lowercases, drops English stop words and folds common plural
//! forms so that "floods" and "flood" land on the same vocabulary entry.

use regex::Regex;
use std::sync::LazyLock;

/// English stop words, sorted for binary search. Contraction fragments
/// ("don", "t", "ve") appear because apostrophes are stripped before the
/// stop word filter runs.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "ain", "all", "am", "an", "and", "any",
    "are", "aren", "as", "at", "be", "because", "been", "before", "being", "below", "between",
    "both", "but", "by", "can", "couldn", "d", "did", "didn", "do", "does", "doesn", "doing",
    "don", "down", "during", "each", "few", "for", "from", "further", "had", "hadn", "has",
    "hasn", "have", "haven", "having", "he", "her", "here", "hers", "herself", "him", "himself",
    "his", "how", "i", "if", "in", "into", "is", "isn", "it", "its", "itself", "just", "ll", "m",
    "ma", "me", "mightn", "more", "most", "mustn", "my", "myself", "needn", "no", "nor", "not",
    "now", "o", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves",
    "out", "over", "own", "re", "s", "same", "shan", "she", "should", "shouldn", "so", "some",
    "such", "t", "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there",
    "these", "they", "this", "those", "through", "to", "too", "under", "until", "up", "ve",
    "very", "was", "wasn", "we", "were", "weren", "what", "when", "where", "which", "while",
    "who", "whom", "why", "will", "with", "won", "wouldn", "y", "you", "your", "yours",
    "yourself", "yourselves",
];

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]+").expect("token split regex"));

/// Splits a message into normalized tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned = NON_ALPHANUMERIC.replace_all(text, " ");
    cleaned
        .split_whitespace()
        .map(str::to_ascii_lowercase)
        .filter(|token| STOP_WORDS.binary_search(&token.as_str()).is_err())
        .map(|token| singularize(&token))
        .collect()
}

/// Folds regular English plurals. Deliberately conservative: short tokens
/// and the usual non-plural endings (-ss, -us, -is) are left alone.
fn singularize(token: &str) -> String {
    if token.len() > 4 && token.ends_with("ies") {
        return format!("{}y", &token[..token.len() - 3]);
    }
    if token.len() > 3
        && token.ends_with('s')
        && !token.ends_with("ss")
        && !token.ends_with("us")
        && !token.ends_with("is")
    {
        return token[..token.len() - 1].to_string();
    }
    token.to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
