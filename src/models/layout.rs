//! Keyboard layout: label slots, keys and the tables they draw from.

use crate::error::KeyboardError;
use crate::models::key::{normalize_keys, KeyRecord, RawKey};
use crate::models::label::{assign_positions, LabelSlot, RawLabelSlot};
use crate::models::table::{RawTable, Table, TableStore};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Capacity hint for one column of a row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnLimit {
    /// Maximum number of keys in this column (0 = unset)
    #[serde(default)]
    pub max_keys: Option<usize>,
}

/// Capacity hints for one row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowLimit {
    /// Maximum number of keys in this row (0 = unset)
    #[serde(default)]
    pub max_keys: Option<usize>,
    /// Per-column hints
    #[serde(default)]
    pub columns: Vec<ColumnLimit>,
}

/// Declarative layout as supplied by the caller or a data file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLayout {
    /// Unique layout name (required)
    #[serde(default)]
    pub name: Option<String>,
    /// Display title
    #[serde(default)]
    pub title: Option<String>,
    /// Label slots (replaces existing slots on update)
    #[serde(default)]
    pub labels: Option<Vec<RawLabelSlot>>,
    /// A single label slot appended after `labels`
    #[serde(default)]
    pub label: Option<RawLabelSlot>,
    /// Key list (replaces existing keys on update)
    #[serde(default)]
    pub keys: Option<Vec<RawKey>>,
    /// Inline tables (replaces the store on update)
    #[serde(default)]
    pub tables: Option<Vec<RawTable>>,
    /// A single table appended after `tables`
    #[serde(default)]
    pub table: Option<RawTable>,
    /// Layout-wide row capacity
    #[serde(default)]
    pub max_row_keys: Option<usize>,
    /// Layout-wide column capacity
    #[serde(default)]
    pub max_column_keys: Option<usize>,
    /// Per-row capacity hints
    #[serde(default)]
    pub row_limits: Option<Vec<RowLimit>>,
}

impl RawLayout {
    /// Creates a raw layout with just a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Parses a layout from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse layout JSON")
    }
}

/// A normalized layout.
///
/// # Validation
///
/// - `name` must be non-empty
/// - every key must have an identifier
/// - table identities must be unique within `tables`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    /// Unique layout name
    pub name: String,
    /// Display title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Label slots in declaration order
    pub labels: Vec<LabelSlot>,
    /// Keys in normalized order
    pub keys: Vec<KeyRecord>,
    /// Tables owned by this layout
    pub tables: TableStore,
    /// Layout-wide row capacity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_row_keys: Option<usize>,
    /// Layout-wide column capacity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_column_keys: Option<usize>,
    /// Per-row capacity hints
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub row_limits: Vec<RowLimit>,
}

impl Layout {
    /// Builds a layout from its declarative form.
    pub fn from_raw(raw: RawLayout) -> Result<Self> {
        let name = raw
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| KeyboardError::validation("layout.name is required"))?;

        let mut layout = Self {
            name,
            title: None,
            labels: Vec::new(),
            keys: Vec::new(),
            tables: TableStore::new(),
            max_row_keys: None,
            max_column_keys: None,
            row_limits: Vec::new(),
        };
        layout.apply(raw)?;
        Ok(layout)
    }

    /// Parses and builds a layout from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_raw(RawLayout::from_json(json)?)
    }

    /// Merges a declarative update into this layout.
    ///
    /// Plural fields (`tables`, `labels`, `keys`) replace what is there; the
    /// singular `table` and `label` append. Scalars replace when present.
    /// The update is applied atomically: on error the layout is unchanged.
    pub fn apply(&mut self, raw: RawLayout) -> Result<()> {
        if let Some(name) = raw.name.as_deref() {
            if !name.is_empty() && name != self.name {
                return Err(KeyboardError::validation(format!(
                    "cannot apply layout '{name}' to layout '{}'",
                    self.name
                ))
                .into());
            }
        }

        let mut tables = match raw.tables {
            Some(tables) => TableStore::from_raw(tables),
            None => Ok(self.tables.clone()),
        }
        .with_context(|| format!("Failed to load tables for layout '{}'", self.name))?;
        if let Some(table) = raw.table {
            tables
                .push(Table::from_raw(table)?)
                .with_context(|| format!("Failed to add table to layout '{}'", self.name))?;
        }

        let labels = match (raw.labels, raw.label) {
            (None, None) => None,
            (labels, label) => {
                let mut slots = labels.unwrap_or_else(|| {
                    self.labels.iter().map(LabelSlot::to_raw).collect()
                });
                slots.extend(label);
                Some(assign_positions(slots))
            }
        };

        let keys = raw
            .keys
            .map(normalize_keys)
            .transpose()
            .with_context(|| format!("Failed to load keys for layout '{}'", self.name))?;

        self.tables = tables;
        if let Some(labels) = labels {
            self.labels = labels;
        }
        if let Some(keys) = keys {
            self.keys = keys;
        }
        if raw.title.is_some() {
            self.title = raw.title;
        }
        if raw.max_row_keys.is_some() {
            self.max_row_keys = raw.max_row_keys;
        }
        if raw.max_column_keys.is_some() {
            self.max_column_keys = raw.max_column_keys;
        }
        if let Some(row_limits) = raw.row_limits {
            self.row_limits = row_limits;
        }

        Ok(())
    }

    /// Adds tables not already defined by the layout itself.
    pub fn add_shared_tables<'a, I>(&mut self, tables: I) -> usize
    where
        I: IntoIterator<Item = &'a Table>,
    {
        self.tables.extend_missing(tables)
    }

    /// Capacity of row `row`; `None` means unbounded.
    #[must_use]
    pub fn row_capacity(&self, row: usize) -> Option<usize> {
        self.row_limits
            .get(row)
            .and_then(|r| r.max_keys)
            .filter(|&n| n > 0)
            .or_else(|| self.max_row_keys.filter(|&n| n > 0))
    }

    /// Capacity of column `column` in row `row`; `None` means unbounded.
    #[must_use]
    pub fn column_capacity(&self, row: usize, column: usize) -> Option<usize> {
        self.row_limits
            .get(row)
            .and_then(|r| r.columns.get(column))
            .and_then(|c| c.max_keys)
            .filter(|&n| n > 0)
            .or_else(|| self.max_column_keys.filter(|&n| n > 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::kind_of;

    #[test]
    fn test_name_required() {
        let err = Layout::from_raw(RawLayout::default()).unwrap_err();
        assert!(kind_of(&err).is_some_and(KeyboardError::is_validation));
    }

    #[test]
    fn test_from_json() {
        let layout = Layout::from_json(
            r#"{
                "name": "uk",
                "title": "Українська",
                "labels": [{"labelTable": "characters/uk", "case": "upper"}],
                "keys": [["й", "ц"], ["ф"]],
                "tables": [{"type": "characters", "name": "uk", "values": ["й", "ц", "ф"]}],
                "maxRowKeys": 12
            }"#,
        )
        .unwrap();

        assert_eq!(layout.name, "uk");
        assert_eq!(layout.keys.len(), 3);
        assert_eq!(layout.labels.len(), 1);
        assert!(layout.labels[0].is_main);
        assert_eq!(layout.tables.len(), 1);
        assert_eq!(layout.row_capacity(5), Some(12));
    }

    #[test]
    fn test_from_json_with_aliased_row_key() {
        let layout = Layout::from_json(r#"{"name":"x","keys":[["a",["g","G"]]]}"#).unwrap();
        assert_eq!(layout.keys.len(), 2);
        assert!(layout.keys[1].key.matches("G"));
        assert_eq!(layout.keys[1].row, Some(0));
    }

    #[test]
    fn test_apply_replaces_and_appends() {
        let mut layout = Layout::from_raw(RawLayout {
            labels: Some(vec![RawLabelSlot::default()]),
            keys: Some(vec!["a".into()]),
            tables: Some(vec![RawTable::new("characters", "en", ["a"])]),
            ..RawLayout::named("en")
        })
        .unwrap();

        layout
            .apply(RawLayout {
                title: Some("English".into()),
                label: Some(RawLabelSlot::default()),
                table: Some(RawTable::new("characters", "numbers", ["1"])),
                ..RawLayout::named("en")
            })
            .unwrap();

        assert_eq!(layout.title.as_deref(), Some("English"));
        assert_eq!(layout.labels.len(), 2);
        assert_eq!(layout.labels[1].position, 1);
        assert_eq!(layout.tables.len(), 2);
        assert_eq!(layout.keys.len(), 1);

        layout
            .apply(RawLayout {
                keys: Some(vec!["x".into(), "y".into()]),
                ..RawLayout::default()
            })
            .unwrap();
        assert_eq!(layout.keys.len(), 2);
    }

    #[test]
    fn test_apply_is_atomic() {
        let mut layout = Layout::from_raw(RawLayout {
            keys: Some(vec!["a".into()]),
            ..RawLayout::named("en")
        })
        .unwrap();
        let before = layout.clone();

        let bad_keys: Vec<RawKey> = serde_json::from_str(r#"["b", {"row": 1}]"#).unwrap();
        let result = layout.apply(RawLayout {
            title: Some("changed".into()),
            keys: Some(bad_keys),
            ..RawLayout::default()
        });

        assert!(result.is_err());
        assert_eq!(layout, before);
    }

    #[test]
    fn test_apply_rejects_other_name() {
        let mut layout = Layout::from_raw(RawLayout::named("en")).unwrap();
        assert!(layout.apply(RawLayout::named("uk")).is_err());
    }

    #[test]
    fn test_capacity_fallbacks() {
        let layout = Layout::from_raw(RawLayout {
            max_row_keys: Some(4),
            max_column_keys: Some(0),
            row_limits: Some(vec![
                RowLimit {
                    max_keys: Some(2),
                    columns: vec![ColumnLimit { max_keys: Some(1) }],
                },
                RowLimit {
                    max_keys: Some(0),
                    columns: Vec::new(),
                },
            ]),
            ..RawLayout::named("limits")
        })
        .unwrap();

        assert_eq!(layout.row_capacity(0), Some(2));
        assert_eq!(layout.row_capacity(1), Some(4));
        assert_eq!(layout.row_capacity(7), Some(4));
        assert_eq!(layout.column_capacity(0, 0), Some(1));
        assert_eq!(layout.column_capacity(0, 1), None);
    }

    #[test]
    fn test_shared_tables_do_not_override_inline() {
        let mut layout = Layout::from_raw(RawLayout {
            tables: Some(vec![RawTable::new("characters", "en", [("a", "a")])]),
            ..RawLayout::named("en")
        })
        .unwrap();
        let shared = Table::from_raw(RawTable::new("characters", "en", [("a", "Z")])).unwrap();

        assert_eq!(layout.add_shared_tables([&shared]), 0);
        let en = layout.tables.find("characters/en").unwrap();
        assert_eq!(en.find_row("a").unwrap().value, "a");
    }
}
