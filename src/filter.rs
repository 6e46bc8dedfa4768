//! Filter oracle: decides whether a piece of raw text is worth indexing.
//!
//! The extraction engine consults a [`FilterOracle`] before emitting most
//! entries. The oracle sees raw identifier or word text and must be pure:
//! the same text always gets the same answer.

use std::collections::HashSet;

/// Predicate over raw identifier or word text.
pub trait FilterOracle: Send + Sync {
    /// Return `true` when `text` should be indexed.
    fn should_index(&self, text: &str) -> bool;
}

impl<F> FilterOracle for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn should_index(&self, text: &str) -> bool {
        self(text)
    }
}

/// Oracle that accepts every non-empty string.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl FilterOracle for AcceptAll {
    fn should_index(&self, text: &str) -> bool {
        !text.is_empty()
    }
}

/// Words that are never useful as search terms: English filler and
/// keywords shared by the supported languages.
const BUILTIN_STOPWORDS: &[&str] = &[
    // english
    "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "has", "have", "in", "into",
    "is", "it", "its", "of", "on", "or", "so", "than", "that", "the", "then", "there", "these",
    "they", "to", "was", "were", "will", "with",
    // keywords
    "break", "case", "continue", "default", "do", "else", "elif", "end", "endif", "false", "if",
    "nil", "none", "null", "pass", "return", "true", "undefined", "void", "while",
    // receivers
    "self", "this", "cls",
];

/// Default oracle: rejects stopwords, numbers, and words shorter than a
/// minimum length.
#[derive(Debug, Clone)]
pub struct StopwordFilter {
    min_len: usize,
    stopwords: HashSet<String>,
    index_numbers: bool,
}

impl Default for StopwordFilter {
    fn default() -> Self {
        Self::new(1)
    }
}

impl StopwordFilter {
    /// Create a filter with the built-in stopword set.
    pub fn new(min_len: usize) -> Self {
        Self {
            min_len,
            stopwords: BUILTIN_STOPWORDS.iter().map(|s| s.to_string()).collect(),
            index_numbers: false,
        }
    }

    /// Add extra stopwords (compared case-insensitively).
    pub fn with_stopwords<'a>(mut self, words: impl IntoIterator<Item = &'a str>) -> Self {
        self.stopwords
            .extend(words.into_iter().map(|w| w.trim().to_lowercase()).filter(|w| !w.is_empty()));
        self
    }

    /// Whether purely numeric words are indexed.
    pub fn index_numbers(mut self, yes: bool) -> Self {
        self.index_numbers = yes;
        self
    }
}

/// `42`, `3.14`, `0x1F`, `1_000`.
fn is_number(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => {
            chars.all(|c| c.is_ascii_hexdigit() || matches!(c, '.' | '_' | 'x' | 'X'))
        }
        _ => false,
    }
}

impl FilterOracle for StopwordFilter {
    fn should_index(&self, text: &str) -> bool {
        if text.is_empty() || text.chars().count() < self.min_len {
            return false;
        }
        if !self.index_numbers && is_number(text) {
            return false;
        }
        !self.stopwords.contains(&text.to_lowercase())
    }
}
