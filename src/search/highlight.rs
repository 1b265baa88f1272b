//! Term highlighting
//!
//! Wraps every case-insensitive occurrence of any term in a marker pair. Works on
//! raw text; escaping for display is the caller's job.

use regex::RegexBuilder;
use tracing::debug;

/// Opening and closing marker wrapped around each match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightMarker {
    pub open: String,
    pub close: String,
}

impl Default for HighlightMarker {
    fn default() -> Self {
        Self::html()
    }
}

impl HighlightMarker {
    /// `<mark>` element, for HTML consumers
    pub fn html() -> Self {
        Self {
            open: "<mark>".to_string(),
            close: "</mark>".to_string(),
        }
    }

    /// Markdown bold, for terminal output
    pub fn markdown() -> Self {
        Self {
            open: "**".to_string(),
            close: "**".to_string(),
        }
    }
}

/// Highlight `terms` inside `text`
pub fn highlight<S: AsRef<str>>(text: &str, terms: &[S], marker: &HighlightMarker) -> String {
    let mut escaped: Vec<String> = terms
        .iter()
        .map(|t| t.as_ref())
        .filter(|t| !t.is_empty())
        .map(regex::escape)
        .collect();

    if text.is_empty() || escaped.is_empty() {
        return text.to_string();
    }

    // Longest first so the alternation prefers the fuller match
    escaped.sort_by(|a, b| b.len().cmp(&a.len()));
    escaped.dedup();

    let pattern = format!("(?:{})", escaped.join("|"));
    let regex = match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(regex) => regex,
        Err(e) => {
            debug!("Highlight pattern rejected: {}", e);
            return text.to_string();
        }
    };

    let replacement = format!(
        "{}${{0}}{}",
        marker.open.replace('$', "$$"),
        marker.close.replace('$', "$$")
    );
    regex.replace_all(text, replacement.as_str()).into_owned()
}
