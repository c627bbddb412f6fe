//! Configuration module for symbol graph analysis.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file (`.symgraph/settings.toml`)
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `SYMGRAPH_` and use double
//! underscores to separate nested levels:
//! - `SYMGRAPH_PROJECT__MAX_FILES=500` sets `project.max_files`
//! - `SYMGRAPH_PROJECT__FOLLOW_INCLUDES=false` sets `project.follow_includes`
//! - `SYMGRAPH_DEBUG=true` sets `debug`

use crate::error::{ProjectError, ProjectResult};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Directory holding the workspace settings file
pub const CONFIG_DIR: &str = ".symgraph";

static GLOBAL_DEBUG: AtomicBool = AtomicBool::new(false);

/// Turn the `debug_print!` output on or off process-wide
pub fn set_global_debug(enabled: bool) {
    GLOBAL_DEBUG.store(enabled, Ordering::Relaxed);
}

pub fn is_global_debug_enabled() -> bool {
    GLOBAL_DEBUG.load(Ordering::Relaxed)
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Project analysis settings
    #[serde(default)]
    pub project: ProjectConfig,

    /// Language-specific settings
    #[serde(default)]
    pub languages: HashMap<String, LanguageConfig>,
}

/// Options controlling discovery, include following and table sizing
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProjectConfig {
    /// Follow `#include <...>` into the system include directories
    #[serde(default = "default_true")]
    pub parse_headers: bool,

    /// Add the files named by includes and imports to the project
    #[serde(default = "default_true")]
    pub follow_includes: bool,

    /// Reserved for resolution against symbols outside the project
    #[serde(default = "default_false")]
    pub resolve_external_symbols: bool,

    /// Maximum number of files, 0 for unlimited
    #[serde(default)]
    pub max_files: usize,

    /// Maximum nesting of include/import discovery
    #[serde(default = "default_max_include_depth")]
    pub max_include_depth: usize,

    /// Initial bucket count of the global symbol table
    #[serde(default = "default_symbol_table_buckets")]
    pub symbol_table_buckets: usize,

    /// Directories searched for `#include <...>`
    #[serde(default = "default_system_include_dirs")]
    pub system_include_dirs: Vec<PathBuf>,

    /// Log filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LanguageConfig {
    /// Whether this language is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// File extensions for this language
    #[serde(default)]
    pub extensions: Vec<String>,
}

fn default_version() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_max_include_depth() -> usize {
    10
}
fn default_symbol_table_buckets() -> usize {
    256
}
fn default_system_include_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("/usr/include")]
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            debug: false,
            project: ProjectConfig::default(),
            languages: default_languages(),
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            parse_headers: true,
            follow_includes: true,
            resolve_external_symbols: false,
            max_files: 0,
            max_include_depth: default_max_include_depth(),
            symbol_table_buckets: default_symbol_table_buckets(),
            system_include_dirs: default_system_include_dirs(),
            log_level: default_log_level(),
        }
    }
}

fn default_languages() -> HashMap<String, LanguageConfig> {
    crate::parsing::Language::ALL
        .iter()
        .map(|language| {
            (
                language.config_key().to_string(),
                LanguageConfig {
                    enabled: true,
                    extensions: language.extensions().iter().map(|e| e.to_string()).collect(),
                },
            )
        })
        .collect()
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> ProjectResult<Self> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still honoring environment
    /// overrides
    pub fn load_from(path: impl AsRef<Path>) -> ProjectResult<Self> {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(path.as_ref()))
            // Double underscore (__) separates nested levels
            .merge(Env::prefixed("SYMGRAPH_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(|e| ProjectError::Config {
                reason: e.to_string(),
            })
    }

    /// Find `.symgraph/settings.toml` from the current directory upwards
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }

        None
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Extensions enabled for analysis across all languages
    pub fn enabled_extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self
            .languages
            .values()
            .filter(|config| config.enabled)
            .flat_map(|config| config.extensions.iter().cloned())
            .collect();
        extensions.sort();
        extensions.dedup();
        extensions
    }
}
