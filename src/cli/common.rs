//! Shared CLI plumbing: error type, exit codes and data file loading.

use crate::config::Config;
use crate::error::kind_of;
use crate::export::TextSurface;
use crate::keyboard::{EventRegistry, Keyboard, KeyboardBuilder};
use crate::models::{RawLayout, RawTable};
use anyhow::Context;
use clap::Args;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Command completed
    Success = 0,
    /// Invalid input: bad layout, unknown key, bad arguments
    Validation = 1,
    /// File could not be read, parsed or written
    Io = 2,
}

/// Error returned by CLI commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliError {
    code: ExitCode,
    message: String,
}

impl CliError {
    /// Creates a validation error (exit code 1).
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            code: ExitCode::Validation,
            message: message.into(),
        }
    }

    /// Creates an I/O error (exit code 2).
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            code: ExitCode::Io,
            message: message.into(),
        }
    }

    /// Classifies a library error: keyboard validation and configuration
    /// errors exit with 1, anything else with 2.
    pub fn from_keyboard(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");
        match kind_of(err) {
            Some(_) => Self::validation(message),
            None => Self::io(message),
        }
    }

    /// Process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.code as i32
    }

    /// Error message without the exit code.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Serialization format of a layout or table file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    /// `.json`
    Json,
    /// `.json5`
    Json5,
    /// `.yaml` / `.yml`
    Yaml,
    /// `.toml`
    Toml,
}

impl DataFormat {
    /// Detects the format from a file extension.
    pub fn from_path(path: &Path) -> CliResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(Self::Json),
            "json5" => Ok(Self::Json5),
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            _ => Err(CliError::validation(format!(
                "Unsupported file type '{}': expected .json, .json5, .yaml, .yml or .toml",
                path.display()
            ))),
        }
    }

    /// Deserializes `content` in this format.
    pub fn parse<T: DeserializeOwned>(self, content: &str) -> anyhow::Result<T> {
        match self {
            Self::Json => serde_json::from_str(content).context("Invalid JSON"),
            Self::Json5 => json5::from_str(content).context("Invalid JSON5"),
            Self::Yaml => serde_yml::from_str(content).context("Invalid YAML"),
            Self::Toml => toml::from_str(content).context("Invalid TOML"),
        }
    }
}

/// A table file holds a list of tables, a `tables` key, or one table.
#[derive(Deserialize)]
#[serde(untagged)]
enum TablesFile {
    Wrapped { tables: Vec<RawTable> },
    Many(Vec<RawTable>),
    One(RawTable),
}

fn load_file<T: DeserializeOwned>(path: &Path, what: &str) -> CliResult<T> {
    let format = DataFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("Failed to read {what} file {}: {e}", path.display())))?;
    format
        .parse(&content)
        .map_err(|e| CliError::io(format!("Failed to parse {what} file {}: {e:#}", path.display())))
}

/// Loads a layout file.
pub fn load_layout(path: &Path) -> CliResult<RawLayout> {
    let layout: RawLayout = load_file(path, "layout")?;
    tracing::debug!(path = %path.display(), name = ?layout.name, "Loaded layout file");
    Ok(layout)
}

/// Loads a table file.
pub fn load_tables(path: &Path) -> CliResult<Vec<RawTable>> {
    let tables = match load_file::<TablesFile>(path, "table")? {
        TablesFile::Wrapped { tables } | TablesFile::Many(tables) => tables,
        TablesFile::One(table) => vec![table],
    };
    tracing::debug!(path = %path.display(), count = tables.len(), "Loaded table file");
    Ok(tables)
}

/// Layout and table files shared by the commands that build a keyboard.
#[derive(Debug, Clone, Args)]
pub struct LayoutSource {
    /// Layout files (.json, .json5, .yaml, .yml, .toml); the last one is active
    #[arg(value_name = "LAYOUT", required = true)]
    pub layouts: Vec<PathBuf>,

    /// Table files shared by every layout
    #[arg(short, long = "tables", value_name = "FILE")]
    pub tables: Vec<PathBuf>,

    /// Name of the layout to activate instead of the last one
    #[arg(long, value_name = "NAME")]
    pub active: Option<String>,
}

impl LayoutSource {
    /// Loads the files and returns a configured builder.
    pub fn builder(&self, config: &Config) -> CliResult<KeyboardBuilder<TextSurface, EventRegistry>> {
        let mut builder = Keyboard::builder();
        for path in &self.tables {
            builder = builder.tables(load_tables(&config.resolve_data_path(path))?);
        }
        for path in &self.layouts {
            builder = builder.layout(load_layout(&config.resolve_data_path(path))?);
        }
        Ok(builder)
    }

    /// Builds the keyboard on `surface` and activates `--active` if given.
    pub fn build(
        &self,
        builder: KeyboardBuilder<TextSurface, EventRegistry>,
        surface: TextSurface,
    ) -> CliResult<Keyboard<TextSurface, EventRegistry>> {
        let mut keyboard = builder
            .container(surface)
            .build(EventRegistry::new())
            .map_err(|e| CliError::from_keyboard(&e))?;
        if let Some(name) = &self.active {
            keyboard
                .use_layout(name)
                .map_err(|e| CliError::from_keyboard(&e))?;
        }
        Ok(keyboard)
    }
}

/// Loads the user configuration.
pub fn load_config() -> CliResult<Config> {
    Config::load().map_err(|e| CliError::validation(format!("Failed to load configuration: {e:#}")))
}

/// Prints `value` as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::io(format!("Failed to serialize output to JSON: {e}")))?;
    println!("{json}");
    Ok(())
}
