//! CLI definition
//!
//! Provides the command-line interface over a prompt library directory

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::models::PromptDraft;
use crate::search::{FilterSpec, SearchOptions};

/// promptshelf CLI
#[derive(Parser, Debug)]
#[command(name = "promptshelf")]
#[command(about = "Search, browse and add prompts in a local prompt library", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding prompts.json, categories.json and tags.json
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE", env = "PROMPTSHELF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output (no short flag to avoid conflicts)
    #[arg(long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search prompts by text, category, tags and date
    Search(SearchArgs),
    /// Print one prompt in full
    Show(ShowArgs),
    /// Add a new prompt
    Add(AddArgs),
    /// List known categories
    Categories,
    /// List known tags
    Tags,
    /// Write a configuration file with default values
    InitConfig(InitConfigArgs),
}

/// Search command arguments
#[derive(Args, Debug, Clone, Default)]
pub struct SearchArgs {
    /// Search terms (case-insensitive); omit to list by recency
    #[arg(default_value = "")]
    pub query: String,

    /// Only prompts in this category
    #[arg(short = 'c', long)]
    pub category: Option<String>,

    /// Only prompts carrying this tag (repeat to require several)
    #[arg(short = 't', long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Earliest date, inclusive (YYYY-MM-DD or RFC 3339)
    #[arg(long, value_name = "DATE")]
    pub from: Option<String>,

    /// Latest date, inclusive through the end of that day
    #[arg(long, value_name = "DATE")]
    pub to: Option<String>,

    /// Tolerate small typos in search terms
    #[arg(short = 'f', long)]
    pub fuzzy: bool,

    /// Bypass the result cache
    #[arg(long)]
    pub no_cache: bool,

    /// Maximum number of results in the Markdown listing
    #[arg(short = 'l', long, default_value_t = 20)]
    pub limit: usize,

    /// First result row of the compact listing (0-based)
    #[arg(long, value_name = "N")]
    pub offset: Option<usize>,

    /// Rows in the compact listing; switches output to one line per result
    #[arg(long, value_name = "N")]
    pub rows: Option<usize>,
}

impl SearchArgs {
    pub fn filters(&self) -> FilterSpec {
        let mut filters = FilterSpec::default();
        if let Some(category) = &self.category {
            filters = filters.with_category(category.clone());
        }
        if !self.tags.is_empty() {
            filters = filters.with_tags(self.tags.iter().cloned());
        }
        if self.from.is_some() || self.to.is_some() {
            filters = filters.with_date_range(self.from.clone(), self.to.clone());
        }
        filters
    }

    pub fn options(&self) -> SearchOptions {
        SearchOptions::default()
            .fuzzy(self.fuzzy)
            .use_cache(!self.no_cache)
            .filters(self.filters())
    }

    /// Compact windowed listing requested
    pub fn is_windowed(&self) -> bool {
        self.rows.is_some() || self.offset.is_some()
    }
}

/// Show command arguments
#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Prompt id (p-...)
    pub id: String,
}

/// Add command arguments
#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    #[arg(long)]
    pub title: String,

    #[arg(short = 'd', long, default_value = "")]
    pub description: String,

    /// Prompt body; read from stdin when omitted
    #[arg(long)]
    pub content: Option<String>,

    #[arg(short = 'c', long, default_value = "")]
    pub category: String,

    #[arg(short = 't', long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,
}

impl AddArgs {
    pub fn into_draft(self, content: String) -> PromptDraft {
        PromptDraft {
            title: self.title,
            description: self.description,
            content,
            tags: self.tags,
            category: self.category,
        }
    }
}

/// Init-config command arguments
#[derive(Args, Debug, Clone)]
pub struct InitConfigArgs {
    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}
