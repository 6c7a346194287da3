//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file sits at
//! the source root and is layered over stock defaults, so it only needs the
//! keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! site_name = "Unknown"     # [[+site.name]]
//! copyright = ""            # [[+site.copyright]]
//! theme = "default"         # [[+site.theme]]
//! layout = "default"        # layout chunk for pages without one
//! exclude = []              # paths to skip; "dir/" skips a directory
//! version = ""              # label of the current docs
//! versions = []             # subdirectories holding older versions
//!
//! [templates]
//! chunk_dirs = ["layouts"]  # later entries take priority
//! snippet_dirs = ["layouts"]
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site title, exposed as `site.name`.
    pub site_name: String,
    /// Copyright line, exposed as `site.copyright`.
    pub copyright: String,
    /// Theme name, exposed as `site.theme`.
    pub theme: String,
    /// Layout chunk used when a page's front matter names none.
    pub layout: String,
    /// Source paths to skip. A trailing `/` skips a whole directory.
    pub exclude: Vec<String>,
    /// Label of the current (root) version.
    pub version: String,
    /// Subdirectories holding older versions, each built into the same
    /// subdirectory of the output.
    pub versions: Vec<String>,
    /// Where chunks and snippets are looked up.
    pub templates: TemplatesConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_name: "Unknown".to_string(),
            copyright: String::new(),
            theme: "default".to_string(),
            layout: "default".to_string(),
            exclude: Vec::new(),
            version: String::new(),
            versions: Vec::new(),
            templates: TemplatesConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layout.trim().is_empty() {
            return Err(ConfigError::Validation("layout must not be empty".into()));
        }
        if !self.versions.is_empty() && self.version.trim().is_empty() {
            return Err(ConfigError::Validation(
                "versions requires a label for the current version in `version`".into(),
            ));
        }
        for version in &self.versions {
            if !is_plain_relative_dir(version) {
                return Err(ConfigError::Validation(format!(
                    "versions entry '{version}' must be a plain subdirectory name"
                )));
            }
        }
        for dir in self
            .templates
            .chunk_dirs
            .iter()
            .chain(&self.templates.snippet_dirs)
        {
            if dir.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "templates directories must not be empty".into(),
                ));
            }
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Every path the scanner skips: the config file, template directories,
    /// version subdirectories, then user excludes.
    pub fn scan_excludes(&self) -> Vec<String> {
        let mut excludes = vec!["config.toml".to_string()];
        for dir in self
            .templates
            .chunk_dirs
            .iter()
            .chain(&self.templates.snippet_dirs)
        {
            let dir = format!("{}/", dir.trim_end_matches('/'));
            if !excludes.contains(&dir) {
                excludes.push(dir);
            }
        }
        excludes.extend(
            self.versions
                .iter()
                .map(|v| format!("{}/", v.trim_end_matches('/'))),
        );
        excludes.extend(self.exclude.iter().cloned());
        excludes
    }
}

fn is_plain_relative_dir(dir: &str) -> bool {
    let dir = dir.trim_end_matches('/');
    !dir.is_empty()
        && !dir.starts_with('/')
        && dir.split('/').all(|seg| !seg.is_empty() && seg != "." && seg != "..")
}

/// Chunk and snippet search directories, relative to the source root.
///
/// Directories are added to the engine in list order, and each one added
/// takes priority over the ones before it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatesConfig {
    pub chunk_dirs: Vec<String>,
    pub snippet_dirs: Vec<String>,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            chunk_dirs: vec!["layouts".to_string()],
            snippet_dirs: vec!["layouts".to_string()],
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel page renderers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# docweave configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Site title, available to templates as [[+site.name]].
site_name = "Unknown"

# Copyright notice, available as [[+site.copyright]].
copyright = ""

# Theme name, available as [[+site.theme]].
theme = "default"

# Layout chunk used for pages whose front matter names none.
# May itself contain tags, e.g. "[[+site.theme]]/page".
layout = "default"

# Source paths to skip. A trailing "/" skips a directory.
exclude = []

# Label of the current documentation version, shown in the version picker.
version = ""

# Subdirectories holding older versions. Each is built into the matching
# subdirectory of the output. Requires `version` to be set.
versions = []

# ---------------------------------------------------------------------------
# Template lookup
# ---------------------------------------------------------------------------
[templates]
# Directories searched for chunks (<name>.html), relative to the source root.
# Later entries take priority over earlier ones.
chunk_dirs = ["layouts"]

# Directories searched for snippets (<name>.sh executables).
snippet_dirs = ["layouts"]

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel page renderers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
