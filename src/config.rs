//! Project configuration.
//!
//! Handles loading, validating, and merging `folio.toml`. The file is
//! optional; stock defaults describe the conventional layout:
//!
//! ```text
//! project/
//! ├── folio.toml                 # optional
//! ├── data/
//! │   └── videos-registry.json   # video registry
//! └── public/                    # web root, URLs derive from here
//!     ├── Stills/                # image tree
//!     ├── Motion/                # project tree
//!     └── _covers/               # copied covers (generated)
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! public_dir = "public"
//! stills_dir = "Stills"                    # under public_dir
//! motion_dir = "Motion"                    # under public_dir
//! covers_dir = "_covers"                   # under public_dir
//! registry = "data/videos-registry.json"   # relative to the project root
//!
//! [metadata]
//! enabled = true            # false = never read image files
//! preview_width = 24        # preview box in pixels (1-64)
//! preview_quality = 40      # preview JPEG quality (1-100)
//!
//! [watch]
//! debounce_ms = 150         # coalescing window for change bursts
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse; override just the values you want:
//!
//! ```toml
//! [watch]
//! debounce_ms = 400
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the project root when no `--config` is given.
pub const CONFIG_FILE: &str = "folio.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration loaded from `folio.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FolioConfig {
    /// Web root, relative to the project root.
    pub public_dir: String,
    /// Image tree directory name, under `public_dir`.
    pub stills_dir: String,
    /// Project tree directory name, under `public_dir`.
    pub motion_dir: String,
    /// Copied-cover directory name, under `public_dir`.
    pub covers_dir: String,
    /// Registry file, relative to the project root.
    pub registry: String,
    pub metadata: MetadataConfig,
    pub watch: WatchConfig,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            public_dir: "public".to_string(),
            stills_dir: "Stills".to_string(),
            motion_dir: "Motion".to_string(),
            covers_dir: "_covers".to_string(),
            registry: "data/videos-registry.json".to_string(),
            metadata: MetadataConfig::default(),
            watch: WatchConfig::default(),
        }
    }
}

/// Image metadata settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataConfig {
    pub enabled: bool,
    pub preview_width: u32,
    pub preview_quality: u32,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            preview_width: 24,
            preview_quality: 40,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 150 }
    }
}

/// A directory name must be a single, non-empty path segment.
fn validate_dir_name(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{key} must not be empty")));
    }
    if value.contains(['/', '\\']) || value == "." || value == ".." {
        return Err(ConfigError::Validation(format!(
            "{key} must be a single directory name, got {value:?}"
        )));
    }
    Ok(())
}

impl FolioConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.public_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "public_dir must not be empty".into(),
            ));
        }
        if self.registry.trim().is_empty() {
            return Err(ConfigError::Validation("registry must not be empty".into()));
        }
        validate_dir_name("stills_dir", &self.stills_dir)?;
        validate_dir_name("motion_dir", &self.motion_dir)?;
        validate_dir_name("covers_dir", &self.covers_dir)?;
        if self.stills_dir == self.motion_dir {
            return Err(ConfigError::Validation(
                "stills_dir and motion_dir must differ".into(),
            ));
        }
        if self.covers_dir == self.stills_dir || self.covers_dir == self.motion_dir {
            return Err(ConfigError::Validation(
                "covers_dir must differ from stills_dir and motion_dir".into(),
            ));
        }
        if !(1..=64).contains(&self.metadata.preview_width) {
            return Err(ConfigError::Validation(
                "metadata.preview_width must be 1-64".into(),
            ));
        }
        if !(1..=100).contains(&self.metadata.preview_quality) {
            return Err(ConfigError::Validation(
                "metadata.preview_quality must be 1-100".into(),
            ));
        }
        if self.watch.debounce_ms == 0 {
            return Err(ConfigError::Validation(
                "watch.debounce_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn public_path(&self, root: &Path) -> PathBuf {
        root.join(&self.public_dir)
    }

    pub fn registry_path(&self, root: &Path) -> PathBuf {
        root.join(&self.registry)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(FolioConfig::default())?)
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

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<FolioConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: FolioConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the project configuration.
///
/// An explicit path must exist; the implicit `<root>/folio.toml` is optional.
pub fn load_config(root: &Path, explicit: Option<&Path>) -> Result<FolioConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Some(toml::from_str(&content)?)
        }
        None => load_raw_config(&root.join(CONFIG_FILE))?,
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock `folio.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# folio-gen configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.

# Web root, relative to this file. Manifest URLs are derived from paths
# relative to it, so /Stills/Cats/a.jpg maps to <public_dir>/Stills/Cats/a.jpg.
public_dir = "public"

# Image tree, under public_dir. Every folder gets a manifest.json.
stills_dir = "Stills"

# Project tree, under public_dir. Each subfolder is a video project.
motion_dir = "Motion"

# Where explicit `*.cover` markers are copied, under public_dir.
# Files in here are generated; stale ones are removed on every build.
covers_dir = "_covers"

# Video registry (JSON), relative to this file.
registry = "data/videos-registry.json"

# ---------------------------------------------------------------------------
# Image metadata (dimensions + inline blur preview)
# ---------------------------------------------------------------------------
[metadata]
# Set to false to skip reading image files entirely; items are then
# emitted without w/h/blurDataURL.
enabled = true

# Longest side of the inline preview, in pixels (1-64).
preview_width = 24

# JPEG quality of the inline preview (1-100).
preview_quality = 40

# ---------------------------------------------------------------------------
# Watch mode
# ---------------------------------------------------------------------------
[watch]
# Bursts of changes closer together than this collapse into one rebuild.
debounce_ms = 150
"##
}
