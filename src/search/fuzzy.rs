//! Fuzzy Matching via edit distance
//!
//! Query terms are compared against document tokens with classic Levenshtein
//! distance (insert, delete, substitute each cost 1) over Unicode scalar values.

/// Token comparator with a configurable edit-distance threshold
#[derive(Debug, Clone, Copy)]
pub struct FuzzyMatcher {
    threshold: usize,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FuzzyMatcher {
    /// Default threshold of 2 edits
    pub fn new() -> Self {
        Self { threshold: 2 }
    }

    pub fn with_threshold(threshold: usize) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Does `term` match any of `tokens`?
    ///
    /// Exact membership is always checked first; with `fuzzy` enabled a token within
    /// the threshold also counts.
    pub fn term_matches<S: AsRef<str>>(&self, term: &str, tokens: &[S], fuzzy: bool) -> bool {
        term_matches(term, tokens, fuzzy, self.threshold)
    }
}

/// Free-function form of [`FuzzyMatcher::term_matches`]
pub fn term_matches<S: AsRef<str>>(term: &str, tokens: &[S], fuzzy: bool, threshold: usize) -> bool {
    if tokens.iter().any(|t| t.as_ref() == term) {
        return true;
    }

    fuzzy && tokens.iter().any(|t| distance(term, t.as_ref()) <= threshold)
}

/// Levenshtein edit distance between `a` and `b`
///
/// Fills the whole DP table row by row; there is no early exit.
pub fn distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, &ac) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &bc) in b.iter().enumerate() {
            let cost = usize::from(ac != bc);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
