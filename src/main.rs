//! promptshelf CLI
//!
//! Searches and edits a prompt library kept as flat JSON files:
//! - `search [QUERY]` - ranked search with filters, or a recency listing
//! - `show ID` / `add` - single prompt access
//! - `categories` / `tags` - catalog listing
//! - `init-config` - write a default configuration file

use std::io::{self, IsTerminal, Read};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use promptshelf::cli::{self, Cli, Commands};
use promptshelf::config::{self, AppConfig};
use promptshelf::error::{validate_prompt_id, validate_query, AppError};
use promptshelf::format;
use promptshelf::search::SearchEngine;
use promptshelf::service::SearchService;
use promptshelf::store::JsonFileStore;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity flags; RUST_LOG wins when set
    let log_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr) // Log to stderr to keep stdout clean
        .init();

    // Handle result and exit with appropriate code
    match run(cli).await {
        Ok(output) => {
            print!("{}", output);
            if !output.ends_with('\n') {
                println!();
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(get_exit_code(&e));
        }
    }
}

async fn run(cli: Cli) -> Result<String> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config::config_path()?,
    };

    if let Commands::InitConfig(args) = &cli.command {
        return execute_init_config(&config_path, args.force);
    }

    let app_config = config::load_config_from(&config_path)
        .map_err(|e| AppError::ConfigError(format!("{:#}", e)))?;
    let data_dir = config::resolve_data_dir(cli.data_dir.clone(), &app_config);
    debug!("Using data directory {}", data_dir.display());

    let service = SearchService::with_engine(
        JsonFileStore::new(&data_dir),
        SearchEngine::init(app_config.search.clone()),
    );

    let output = match cli.command {
        Commands::Search(args) => execute_search_cli(&service, &app_config, args).await,
        Commands::Show(args) => execute_show_cli(&service, args).await,
        Commands::Add(args) => execute_add_cli(&service, args).await,
        Commands::Categories => Ok(format::format_categories(&service.categories().await)),
        Commands::Tags => Ok(format::format_tags(&service.tags().await)),
        Commands::InitConfig(args) => execute_init_config(&config_path, args.force),
    };

    service.dispose().await;
    output
}

/// Execute search command in CLI mode
async fn execute_search_cli(
    service: &SearchService<JsonFileStore>,
    app_config: &AppConfig,
    args: cli::SearchArgs,
) -> Result<String> {
    validate_query(&args.query)?;

    let loaded = service.load_prompts().await;
    debug!("{} prompts loaded", loaded.len());

    let outcome = service.search(&args.query, &args.options()).await;

    if args.is_windowed() {
        let rows = args.rows.unwrap_or(20);
        let offset = args.offset.unwrap_or(0);
        Ok(format::render_window(&outcome, offset, rows, &app_config.list))
    } else {
        Ok(format::format_search_results(&outcome, &args.query, args.limit))
    }
}

/// Execute show command in CLI mode
async fn execute_show_cli(service: &SearchService<JsonFileStore>, args: cli::ShowArgs) -> Result<String> {
    validate_prompt_id(&args.id)?;

    let prompt = service
        .prompt(&args.id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("prompt {}", args.id)))?;

    Ok(format::format_prompt(&prompt))
}

/// Execute add command in CLI mode
async fn execute_add_cli(service: &SearchService<JsonFileStore>, args: cli::AddArgs) -> Result<String> {
    let content = match args.content.clone() {
        Some(content) => content,
        None if io::stdin().is_terminal() => String::new(),
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read prompt content from stdin")?;
            input
        }
    };

    let prompt = service.create_prompt(args.into_draft(content)).await?;
    info!("Added prompt {}", prompt.id);

    Ok(format!("✓ Added prompt {} ({})", prompt.title, prompt.id))
}

/// Execute init-config command in CLI mode
fn execute_init_config(path: &Path, force: bool) -> Result<String> {
    if path.exists() && !force {
        return Err(AppError::InvalidInput(format!(
            "{} already exists; pass --force to overwrite",
            path.display()
        ))
        .into());
    }

    config::save_config(&AppConfig::default(), path)
        .map_err(|e| AppError::ConfigError(format!("{:#}", e)))?;

    Ok(format!("✓ Wrote default configuration to {}", path.display()))
}

/// Map an error to the process exit code
fn get_exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<AppError>()
        .map(AppError::exit_code)
        .unwrap_or(5)
}
