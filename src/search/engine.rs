//! Search Engine Integration
//!
//! Ties together query parsing, filtering, scoring, caching and analytics
//! to provide the public search entry point.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::analytics::{self, AnalyticsSink, SearchEvent, TracingAnalytics};
use super::cache::{cache_key, ResultCache};
use super::filter::{apply_filters, parse_timestamp, FilterSpec};
use super::ranking::{MatchScore, Scorer};
use super::tokenizer::{ParsedQuery, QueryParser};
use crate::config::SearchConfig;
use crate::models::Prompt;

/// Per-call search options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub filters: FilterSpec,
    pub fuzzy: bool,
    pub use_cache: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            filters: FilterSpec::default(),
            fuzzy: false,
            use_cache: true,
        }
    }
}

impl SearchOptions {
    pub fn fuzzy(mut self, fuzzy: bool) -> Self {
        self.fuzzy = fuzzy;
        self
    }

    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn filters(mut self, filters: FilterSpec) -> Self {
        self.filters = filters;
        self
    }
}

/// Ranked results plus the terms to highlight in them
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub results: Vec<Prompt>,
    pub highlight_terms: Vec<String>,
}

/// Search result with content and score
#[derive(Debug, Clone)]
pub struct SearchResult<'a> {
    /// The matched prompt
    pub prompt: &'a Prompt,
    /// Match score; `None` in filter-only mode
    pub score: Option<MatchScore>,
}

/// Search engine that combines filtering, matching, ranking and caching
pub struct SearchEngine {
    scorer: Scorer,
    cache: ResultCache,
    analytics: Box<dyn AnalyticsSink>,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchEngine {
    /// Create a new search engine with default configuration
    pub fn new() -> Self {
        Self::init(SearchConfig::default())
    }

    /// Create a search engine with custom configuration
    pub fn init(config: SearchConfig) -> Self {
        let cache = ResultCache::new(config.cache_capacity);
        Self {
            scorer: Scorer::new(config),
            cache,
            analytics: Box::new(TracingAnalytics),
        }
    }

    /// Replace the analytics sink
    pub fn with_analytics(mut self, sink: impl AnalyticsSink + 'static) -> Self {
        self.analytics = Box::new(sink);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        self.scorer.config()
    }

    /// Search prompts with a query string
    ///
    /// Returns results sorted by relevance (highest score first), or by recency when
    /// the query has no tokens.
    pub fn search(&mut self, prompts: &[Prompt], query: &str, options: &SearchOptions) -> SearchOutcome {
        let parsed = QueryParser::parse(query);

        let key = if options.use_cache {
            cache_key(&parsed.normalized, &options.filters, options.fuzzy)
        } else {
            None
        };

        if let Some(cached) = key.as_deref().and_then(|k| self.cache.get(k)) {
            debug!("Cache hit for query '{}'", parsed.normalized);
            self.record(&parsed, options, cached.results.len(), true);
            return cached;
        }

        let outcome = SearchOutcome {
            results: self
                .rank(prompts, &parsed, options)
                .into_iter()
                .map(|r| r.prompt.clone())
                .collect(),
            highlight_terms: parsed.tokens.clone(),
        };

        if let Some(key) = key {
            self.cache.insert(key, outcome.clone());
        }

        self.record(&parsed, options, outcome.results.len(), false);
        outcome
    }

    /// Filter and order prompts, keeping the score of each result
    ///
    /// Never touches the cache.
    pub fn rank<'a>(
        &self,
        prompts: &'a [Prompt],
        parsed: &ParsedQuery,
        options: &SearchOptions,
    ) -> Vec<SearchResult<'a>> {
        let candidates = apply_filters(prompts, &options.filters);
        debug!(
            "{} of {} prompts pass filters",
            candidates.len(),
            prompts.len()
        );

        if parsed.is_empty() {
            return sort_by_recency(candidates)
                .into_iter()
                .map(|prompt| SearchResult { prompt, score: None })
                .collect();
        }

        let min_score = self.config().min_score;
        let mut results: Vec<SearchResult<'a>> = candidates
            .into_iter()
            .filter_map(|prompt| {
                let score = self
                    .scorer
                    .score_detailed(prompt, &parsed.tokens, options.fuzzy);
                (score.final_score >= min_score).then_some(SearchResult {
                    prompt,
                    score: Some(score),
                })
            })
            .collect();

        // Stable: equal scores keep input order
        results.sort_by(|a, b| final_score(b).total_cmp(&final_score(a)));
        results
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Release cached results; the engine stays usable and starts cold
    pub fn dispose(&mut self) {
        debug!("Disposing search engine ({} cached entries)", self.cache.len());
        self.cache.clear();
    }

    fn record(&self, parsed: &ParsedQuery, options: &SearchOptions, result_count: usize, cache_hit: bool) {
        let event = SearchEvent {
            query: parsed.normalized.clone(),
            filters: options.filters.clone(),
            fuzzy: options.fuzzy,
            result_count,
            cache_hit,
        };
        analytics::emit(self.analytics.as_ref(), &event);
    }
}

fn final_score(result: &SearchResult<'_>) -> f64 {
    result.score.as_ref().map_or(0.0, |s| s.final_score)
}

/// Most recent first by `updated_at`, falling back to `created_at`; undated last
fn sort_by_recency(mut prompts: Vec<&Prompt>) -> Vec<&Prompt> {
    prompts.sort_by_key(|p| Reverse(p.effective_timestamp().and_then(parse_timestamp)));
    prompts
}
