//! Ranking & Scoring System
//!
//! Multi-field weighted scoring: per-field token matches, a coverage bonus for
//! distinct satisfied terms, and a phrase bonus when the whole query appears
//! verbatim.

use std::collections::HashSet;

use super::fuzzy::term_matches;
use super::tokenizer::tokenize;
use crate::config::SearchConfig;
use crate::models::Prompt;

/// Searchable fields in phrase-bonus priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Description,
    Content,
    Tags,
}

/// Complete match score with all components
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchScore {
    /// Sum of field weights over every (token, field) match
    pub field_score: f64,
    /// Coverage bonus for distinct matched terms
    pub coverage_bonus: f64,
    /// Phrase bonus, at most one field contributes
    pub phrase_bonus: f64,
    /// Field that earned the phrase bonus
    pub phrase_field: Option<Field>,
    /// Distinct query tokens that matched at least one field, in query order
    pub matched_terms: Vec<String>,
    /// Final weighted score
    pub final_score: f64,
}

/// Field tokens computed once per scoring call
struct FieldTokens {
    title: Vec<String>,
    description: Vec<String>,
    content: Vec<String>,
    tags: Vec<String>,
}

impl FieldTokens {
    fn of(prompt: &Prompt) -> Self {
        Self {
            title: tokenize(&prompt.title),
            description: tokenize(&prompt.description),
            content: tokenize(&prompt.content),
            tags: tokenize(&prompt.tags_text()),
        }
    }
}

/// Scores prompts against tokenized queries
#[derive(Debug, Clone, Default)]
pub struct Scorer {
    config: SearchConfig,
}

impl Scorer {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Relevance of `prompt` for `query_tokens`; 0.0 means no match at all
    pub fn score(&self, prompt: &Prompt, query_tokens: &[String], fuzzy: bool) -> f64 {
        self.score_detailed(prompt, query_tokens, fuzzy).final_score
    }

    /// Same as [`Scorer::score`] with the individual components kept
    pub fn score_detailed(&self, prompt: &Prompt, query_tokens: &[String], fuzzy: bool) -> MatchScore {
        let fields = FieldTokens::of(prompt);
        let weights = &self.config.weights;
        let threshold = self.config.fuzzy_threshold;

        let weighted = [
            (&fields.title, weights.title),
            (&fields.description, weights.description),
            (&fields.content, weights.content),
            (&fields.tags, weights.tags),
        ];

        let mut field_score = 0.0;
        let mut seen: HashSet<&str> = HashSet::new();
        let mut matched_terms = Vec::new();

        for term in query_tokens {
            let mut term_hit = false;
            // Every matching field counts, not just the first
            for (tokens, weight) in &weighted {
                if term_matches(term, tokens.as_slice(), fuzzy, threshold) {
                    field_score += weight;
                    term_hit = true;
                }
            }

            if term_hit && seen.insert(term.as_str()) {
                matched_terms.push(term.clone());
            }
        }

        let coverage_bonus = self.config.coverage_bonus * matched_terms.len() as f64;
        let (phrase_field, phrase_bonus) = self.phrase_bonus(prompt, query_tokens);

        MatchScore {
            field_score,
            coverage_bonus,
            phrase_bonus,
            phrase_field,
            matched_terms,
            final_score: field_score + coverage_bonus + phrase_bonus,
        }
    }

    fn phrase_bonus(&self, prompt: &Prompt, query_tokens: &[String]) -> (Option<Field>, f64) {
        if query_tokens.is_empty() {
            return (None, 0.0);
        }

        let phrase = query_tokens.join(" ");
        let bonus = &self.config.phrase_bonus;
        let candidates = [
            (Field::Title, &prompt.title, bonus.title),
            (Field::Description, &prompt.description, bonus.description),
            (Field::Content, &prompt.content, bonus.content),
        ];

        candidates
            .into_iter()
            .find(|(_, text, _)| text.to_lowercase().contains(&phrase))
            .map_or((None, 0.0), |(field, _, value)| (Some(field), value))
    }
}
