//! Resolution pipeline: bindings, labels and placement in one pass.

use crate::models::{KeyId, LabelSlot, Layout};
use crate::services::labels::LabelResolver;
use crate::services::placement::{place_keys, Grid};
use anyhow::{Context, Result};
use serde::Serialize;

/// A key with its labels, code and grid cell derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedKey {
    /// Index into the layout's key list
    pub index: usize,
    /// Identifier or aliases
    pub key: KeyId,
    /// Explicit or derived code
    pub code: Option<String>,
    /// One label list per slot, in slot declaration order
    pub labels: Vec<Vec<String>>,
    /// Grid row
    pub row: usize,
    /// Grid column
    pub column: usize,
    /// Disabled keys ignore activation
    pub disabled: bool,
    /// Highlighted keys are emphasized
    pub hilighted: bool,
}

impl ResolvedKey {
    /// Region identifier on the rendering surface.
    #[must_use]
    pub fn id(&self) -> String {
        self.key.region_id()
    }
}

/// Fully derived view of one layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedLayout {
    /// Layout name
    pub name: String,
    /// Display title
    pub title: Option<String>,
    /// Label slots in declaration order
    pub slots: Vec<LabelSlot>,
    /// Resolved keys in layout order
    pub keys: Vec<ResolvedKey>,
    /// Derived grid
    pub grid: Grid,
}

impl ResolvedLayout {
    /// Relative key width: `1 / longest row`, rounded to 4 decimals.
    #[must_use]
    pub fn key_width(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let longest = self.grid.longest_row().max(1) as f64;
        (10_000.0 / longest).round() / 10_000.0
    }

    /// Finds a key by region identifier, else by any of its aliases.
    #[must_use]
    pub fn key(&self, id: &str) -> Option<&ResolvedKey> {
        self.keys
            .iter()
            .find(|k| k.key.region_id() == id)
            .or_else(|| self.keys.iter().find(|k| k.key.matches(id)))
    }

    /// Finds the key a physical keystroke maps to.
    #[must_use]
    pub fn key_for_keystroke(&self, keystroke: &str) -> Option<&ResolvedKey> {
        self.keys.iter().find(|k| k.key.matches_keystroke(keystroke))
    }
}

/// Resolves labels and grid placement for every key of `layout`.
///
/// The layout is not modified; resolving twice gives equal results.
///
/// # Errors
///
/// Fails with a configuration error if a label slot references a table the
/// layout's store does not hold.
pub fn resolve_layout(layout: &Layout) -> Result<ResolvedLayout> {
    let resolver = LabelResolver::new(layout)
        .with_context(|| format!("Failed to resolve labels for layout '{}'", layout.name))?;
    let (placements, grid) = place_keys(layout);

    let keys = layout
        .keys
        .iter()
        .zip(placements)
        .enumerate()
        .map(|(index, (record, placement))| {
            let derived = resolver.resolve(record);
            ResolvedKey {
                index,
                key: record.key.clone(),
                code: derived.code,
                labels: derived.labels,
                row: placement.row,
                column: placement.column,
                disabled: record.disabled,
                hilighted: record.hilighted,
            }
        })
        .collect();

    Ok(ResolvedLayout {
        name: layout.name.clone(),
        title: layout.title.clone(),
        slots: layout.labels.clone(),
        keys,
        grid,
    })
}
