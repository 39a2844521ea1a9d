//! Inspect command: prints resolved labels, codes and grid cells as JSON.

use crate::cli::common::{load_config, print_json, CliError, CliResult, LayoutSource};
use crate::export::TextSurface;
use crate::services::{ResolvedKey, ResolvedLayout};
use clap::Args;
use serde::Serialize;

/// Inspect how a layout resolves
#[derive(Debug, Clone, Args)]
pub struct InspectArgs {
    #[command(flatten)]
    pub source: LayoutSource,

    /// Only show the key with this identifier
    #[arg(short, long, value_name = "ID")]
    pub key: Option<String>,
}

/// One resolved key.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyReport {
    /// Region identifier
    pub id: String,
    /// All identifiers of the key
    pub aliases: Vec<String>,
    /// Explicit or derived code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Label values per slot
    pub labels: Vec<Vec<String>>,
    /// Grid row
    pub row: usize,
    /// Grid column
    pub column: usize,
    /// Disabled flag
    pub disabled: bool,
    /// Highlighted flag
    pub hilighted: bool,
}

impl From<&ResolvedKey> for KeyReport {
    fn from(key: &ResolvedKey) -> Self {
        Self {
            id: key.id(),
            aliases: key.key.aliases().to_vec(),
            code: key.code.clone(),
            labels: key.labels.clone(),
            row: key.row,
            column: key.column,
            disabled: key.disabled,
            hilighted: key.hilighted,
        }
    }
}

/// The active layout after resolution.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutReport {
    /// Layout name
    pub name: String,
    /// Display title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Registered layout names, in registration order
    pub layouts: Vec<String>,
    /// Relative key width
    pub key_width: f64,
    /// Keys per grid row
    pub row_sizes: Vec<usize>,
    /// Keys in layout order
    pub keys: Vec<KeyReport>,
}

impl LayoutReport {
    fn new(resolved: &ResolvedLayout, layouts: Vec<String>) -> Self {
        Self {
            name: resolved.name.clone(),
            title: resolved.title.clone(),
            layouts,
            key_width: resolved.key_width(),
            row_sizes: resolved.grid.row_sizes(),
            keys: resolved.keys.iter().map(KeyReport::from).collect(),
        }
    }
}

impl InspectArgs {
    /// Execute the inspect command
    pub fn execute(&self) -> CliResult<()> {
        let config = load_config()?;
        let builder = self.source.builder(&config)?;
        let keyboard = self
            .source
            .build(builder, TextSurface::from_config(&config.ui))?;

        if let Some(id) = &self.key {
            let key = keyboard
                .key(id)
                .ok_or_else(|| CliError::validation(format!("Unknown key '{id}'")))?;
            return print_json(&KeyReport::from(key));
        }

        let layouts = keyboard.layouts().iter().map(|l| l.name.clone()).collect();
        print_json(&LayoutReport::new(keyboard.resolved(), layouts))
    }
}
