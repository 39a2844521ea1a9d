//! Configuration management for the command-line front end.
//!
//! This module handles loading, validating, and saving configuration in TOML
//! format with platform-specific directory resolution. The keyboard core does
//! not read configuration; only the CLI and the text surface do.

use crate::constants::{APP_DATA_DIR, CONFIG_DIR_ENV};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Smallest usable text-surface cell width.
pub const MIN_KEY_WIDTH: usize = 3;

/// Path configuration for file system locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PathConfig {
    /// Directory searched for relative layout and table paths
    #[serde(default)]
    pub layouts_dir: Option<PathBuf>,
}

/// Text rendering preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Width of one key cell in characters, borders included
    #[serde(default = "default_key_width")]
    pub key_width: usize,
    /// Draw the second label line (non-main slots)
    #[serde(default = "default_true")]
    pub show_alt_labels: bool,
    /// Mark disabled and highlighted keys in the key border
    #[serde(default = "default_true")]
    pub state_markers: bool,
}

/// Default key cell width
fn default_key_width() -> usize {
    9
}

fn default_true() -> bool {
    true
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            key_width: default_key_width(),
            show_alt_labels: true,
            state_markers: true,
        }
    }
}

/// Application configuration.
///
/// # File Location
///
/// - Linux: `~/.config/okeyboard/config.toml`
/// - macOS: `~/Library/Application Support/okeyboard/config.toml`
/// - Windows: `%APPDATA%\okeyboard\config.toml`
///
/// # Validation
///
/// - `ui.key_width` must be at least 3
/// - `paths.layouts_dir`, if set, must be an existing directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// File system paths
    #[serde(default)]
    pub paths: PathConfig,
    /// Rendering preferences
    #[serde(default)]
    pub ui: UiConfig,
}

impl Config {
    /// Creates a new Config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the platform-specific config directory path.
    ///
    /// `OKEYBOARD_CONFIG_DIR` overrides the platform default.
    pub fn config_dir() -> Result<PathBuf> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
            return Ok(PathBuf::from(dir));
        }

        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join(APP_DATA_DIR);

        Ok(config_dir)
    }

    /// Gets the full path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Loads configuration from the default config file.
    ///
    /// If the file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Loads configuration from `path`, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to the default config file.
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir()?;
        fs::create_dir_all(&config_dir).with_context(|| {
            format!("Failed to create config directory: {}", config_dir.display())
        })?;
        self.save_to(&Self::config_file_path()?)
    }

    /// Saves configuration to `path` using atomic write.
    ///
    /// Uses temp file + rename pattern for atomic writes.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = self.to_toml()?;
        let temp_path = path.with_extension("toml.tmp");

        fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write temp config file: {}", temp_path.display()))?;

        fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to rename temp config file to: {}", path.display()))?;

        Ok(())
    }

    /// Serializes the configuration as pretty TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Validates configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.ui.key_width < MIN_KEY_WIDTH {
            anyhow::bail!(
                "ui.key_width must be at least {MIN_KEY_WIDTH}, got {}",
                self.ui.key_width
            );
        }

        if let Some(dir) = &self.paths.layouts_dir {
            if !dir.is_dir() {
                anyhow::bail!("Layouts directory does not exist: {}", dir.display());
            }
        }

        Ok(())
    }

    /// Resolves a layout or table path given on the command line.
    ///
    /// Paths that exist as given are returned unchanged; relative paths are
    /// otherwise looked up in `paths.layouts_dir`.
    #[must_use]
    pub fn resolve_data_path(&self, path: &Path) -> PathBuf {
        if path.exists() || path.is_absolute() {
            return path.to_path_buf();
        }
        self.paths
            .layouts_dir
            .as_ref()
            .map(|dir| dir.join(path))
            .filter(|candidate| candidate.exists())
            .unwrap_or_else(|| path.to_path_buf())
    }
}
