//! Query & Field Tokenizer
//!
//! Turns free text into comparable word tokens: NFC normalized, lower-cased,
//! punctuation stripped, split on whitespace.

use unicode_normalization::UnicodeNormalization;

/// Parsed and normalized search query
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuery {
    /// Original unmodified query
    pub original: String,
    /// Trimmed query, used as the cache key component
    pub normalized: String,
    /// Word tokens in query order (duplicates kept)
    pub tokens: Vec<String>,
}

impl ParsedQuery {
    /// Empty token list means filter-only mode
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens re-joined with single spaces, used for phrase matching
    pub fn phrase(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Query parser and preprocessor
pub struct QueryParser;

impl QueryParser {
    /// Parse a search query into its components
    pub fn parse(query: &str) -> ParsedQuery {
        let normalized = query.trim().to_string();
        let tokens = tokenize(&normalized);

        ParsedQuery {
            original: query.to_string(),
            normalized,
            tokens,
        }
    }
}

/// Word characters are letters, digits and underscore
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Tokenize text into lower-cased word tokens
pub fn tokenize(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let cleaned: String = text
        .nfc()
        .flat_map(char::to_lowercase)
        .filter(|&c| is_word_char(c) || c.is_whitespace())
        .collect();

    // Stripping can bring a base letter next to its combining mark; compose again
    // so re-tokenizing the output is a no-op
    let cleaned: String = cleaned.nfc().collect();

    cleaned.split_whitespace().map(str::to_string).collect()
}
