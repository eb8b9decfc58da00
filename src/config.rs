//! Configuration module for the paper pipeline.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file (`.splice/settings.toml`)
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `SPLICE_` and use double
//! underscores to separate nested levels:
//! - `SPLICE_PATHS__DB_PATH=/data/db` sets `paths.db_path`
//! - `SPLICE_STORE__SEARCH_LIMIT=10` sets `store.search_limit`
//! - `SPLICE_LOGGING__DEFAULT=debug` sets `logging.default`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Directory holding the workspace configuration.
pub const CONFIG_DIR: &str = ".splice";

const CONFIG_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "SPLICE_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Input, intermediate and database locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Vector store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Log levels
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PathsConfig {
    /// Directory scanned for `*.pdf` files
    #[serde(default = "default_papers_dir")]
    pub papers_dir: PathBuf,

    /// Directory receiving one JSON record per paper
    #[serde(default = "default_processed_dir")]
    pub processed_dir: PathBuf,

    /// Persistent vector database
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StoreConfig {
    #[serde(default = "default_collection_name")]
    pub collection_name: String,

    /// Only used when the collection is first created
    #[serde(default = "default_collection_description")]
    pub collection_description: String,

    /// fastembed model name
    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Query run by `splice setup` after loading
    #[serde(default = "default_example_query")]
    pub example_query: String,

    #[serde(default = "default_example_results")]
    pub example_results: usize,

    /// Print model download progress on first use
    #[serde(default = "default_false")]
    pub show_download_progress: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default level for all targets
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `store = "debug"`
    #[serde(default)]
    pub modules: BTreeMap<String, String>,
}

// Default value functions
fn default_version() -> u32 { 1 }
fn default_papers_dir() -> PathBuf { PathBuf::from("data/papers") }
fn default_processed_dir() -> PathBuf { PathBuf::from("data/processed") }
fn default_db_path() -> PathBuf { PathBuf::from("data/vector_db") }
fn default_collection_name() -> String { crate::store::DEFAULT_COLLECTION_NAME.to_string() }
fn default_collection_description() -> String { crate::store::DEFAULT_COLLECTION_DESCRIPTION.to_string() }
fn default_embedding_model() -> String { "AllMiniLML6V2".to_string() }
fn default_search_limit() -> usize { crate::store::DEFAULT_SEARCH_LIMIT }
fn default_example_query() -> String { "spliceosome programming".to_string() }
fn default_example_results() -> usize { 3 }
fn default_false() -> bool { false }
fn default_log_level() -> String { "warn".to_string() }

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            paths: PathsConfig::default(),
            store: StoreConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            papers_dir: default_papers_dir(),
            processed_dir: default_processed_dir(),
            db_path: default_db_path(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            collection_name: default_collection_name(),
            collection_description: default_collection_description(),
            model: default_embedding_model(),
            search_limit: default_search_limit(),
            example_query: default_example_query(),
            example_results: default_example_results(),
            show_download_progress: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        // Try to find the workspace config by looking for .splice directory
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| Path::new(CONFIG_DIR).join(CONFIG_FILE));

        Self::load_from(config_path)
    }

    /// Load configuration from a specific file. A missing file only
    /// contributes nothing.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            // Double underscore (__) separates nested levels,
            // single underscore stays within field names
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find `.splice/settings.toml` in the current directory or an ancestor
    pub fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join(CONFIG_FILE));
            }
        }

        None
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Write a default settings file below `root`
    pub fn init_config_file(root: impl AsRef<Path>, force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = root.as_ref().join(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        Settings::default().save(&config_path)?;
        Ok(config_path)
    }
}
