//! Prompt search: tokenization, fuzzy matching, weighted ranking, filtering,
//! result caching and highlighting

pub mod analytics;
pub mod cache;
pub mod engine;
pub mod filter;
pub mod fuzzy;
pub mod highlight;
pub mod ranking;
pub mod tokenizer;


pub use analytics::{AnalyticsSink, NoopAnalytics, SearchEvent, TracingAnalytics};
pub use cache::ResultCache;
pub use engine::{SearchEngine, SearchOptions, SearchOutcome, SearchResult};
pub use filter::{apply_filters, DateRange, FilterSpec};
pub use fuzzy::{distance, term_matches, FuzzyMatcher};
pub use highlight::{highlight, HighlightMarker};
pub use ranking::{Field, MatchScore, Scorer};
pub use tokenizer::{tokenize, ParsedQuery, QueryParser};
