//! promptshelf: prompt library search, ranking and virtualized listing
//!
//! - [`search`] - tokenizer, fuzzy matching, weighted scoring, filters, result cache
//! - [`virtual_list`] - windowed rendering over large result lists
//! - [`service`] - composition root tying a [`store::PromptStore`] to the engine
//! - [`requests`] - in-flight deduplication and stale-response guard

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod requests;
pub mod search;
pub mod service;
pub mod store;
pub mod virtual_list;
