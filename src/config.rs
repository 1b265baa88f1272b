//! Configuration for search tuning, list virtualization and data location
//!
//! Loaded from a JSON file; every field has a default so a partial (or missing)
//! file is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "PROMPTSHELF_CONFIG";
/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "PROMPTSHELF_DATA_DIR";

/// Per-field weights added when a query token matches that field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldWeights {
    pub title: f64,
    pub description: f64,
    pub content: f64,
    pub tags: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            title: 10.0,
            description: 5.0,
            content: 3.0,
            tags: 7.0,
        }
    }
}

/// Bonus for the whole query appearing verbatim; first field wins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhraseBonus {
    pub title: f64,
    pub description: f64,
    pub content: f64,
}

impl Default for PhraseBonus {
    fn default() -> Self {
        Self {
            title: 20.0,
            description: 15.0,
            content: 10.0,
        }
    }
}

/// Search engine tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub weights: FieldWeights,
    /// Added once per distinct query token that matched any field
    pub coverage_bonus: f64,
    pub phrase_bonus: PhraseBonus,
    /// Maximum edit distance for a fuzzy token match (lower is stricter)
    pub fuzzy_threshold: usize,
    /// Documents scoring below this are dropped from ranked results
    pub min_score: f64,
    /// Result cache entries kept before the oldest is evicted
    pub cache_capacity: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            weights: FieldWeights::default(),
            coverage_bonus: 5.0,
            phrase_bonus: PhraseBonus::default(),
            fuzzy_threshold: 2,
            min_score: 0.1,
            cache_capacity: 100,
        }
    }
}

/// Virtualized list defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualListConfig {
    /// Extra rows rendered above and below the viewport
    pub buffer: usize,
    pub item_height: f64,
}

impl Default for VirtualListConfig {
    fn default() -> Self {
        Self {
            buffer: 5,
            item_height: 1.0,
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub list: VirtualListConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

/// Get the path to the configuration file
pub fn config_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }

    let config_dir = dirs::config_dir().context("Cannot determine config directory")?;
    Ok(config_dir.join("promptshelf").join("config.json"))
}

/// Load the configuration from an explicit path; a missing file yields defaults
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config: AppConfig = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    Ok(config)
}

/// Save the configuration to disk
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let data = serde_json::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(path, data).context("Failed to write config file")?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(path, perms)?;
    }

    Ok(())
}

/// Resolve the data directory: explicit flag, then config, then env, then platform default
pub fn resolve_data_dir(flag: Option<PathBuf>, config: &AppConfig) -> PathBuf {
    if let Some(dir) = flag {
        return dir;
    }
    if let Some(dir) = &config.data_dir {
        return dir.clone();
    }
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("promptshelf")
}
