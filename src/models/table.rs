//! Cross-reference data tables.
//!
//! A [`Table`] maps key identifiers to display values (letters, Morse codes,
//! phonetic names). Tables are grouped in a [`TableStore`] owned by a layout
//! and referenced by their full name `type/name`.

use crate::error::KeyboardError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single key → value row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    /// Row key, unique within its table
    pub key: String,
    /// Display value (defaults to `key`)
    pub value: String,
    /// Alternative values shown after `value`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alt_values: Vec<String>,
}

impl TableRow {
    /// Creates a row with an explicit value.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            alt_values: Vec::new(),
        }
    }

    /// Adds alternative values.
    pub fn with_alt_values<I, S>(mut self, alt_values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alt_values = alt_values.into_iter().map(Into::into).collect();
        self
    }

    /// Iterates over `value` followed by every alternative value.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.value.as_str()).chain(self.alt_values.iter().map(String::as_str))
    }
}

/// Declarative row: either a bare key or an object with optional fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawRow {
    /// `"a"` expands to `{ key: "a", value: "a" }`
    Key(String),
    /// `{ key, value?, altValues? }`
    Row {
        /// Row key (required)
        #[serde(default)]
        key: Option<String>,
        /// Row value (defaults to key)
        #[serde(default)]
        value: Option<String>,
        /// Alternative values
        #[serde(default, rename = "altValues")]
        alt_values: Vec<String>,
    },
}

impl From<&str> for RawRow {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<(&str, &str)> for RawRow {
    fn from((key, value): (&str, &str)) -> Self {
        Self::Row {
            key: Some(key.to_string()),
            value: Some(value.to_string()),
            alt_values: Vec::new(),
        }
    }
}

impl From<TableRow> for RawRow {
    fn from(row: TableRow) -> Self {
        Self::Row {
            key: Some(row.key),
            value: Some(row.value),
            alt_values: row.alt_values,
        }
    }
}

impl TryFrom<RawRow> for TableRow {
    type Error = KeyboardError;

    fn try_from(raw: RawRow) -> std::result::Result<Self, Self::Error> {
        let (key, value, alt_values) = match raw {
            RawRow::Key(key) => (Some(key), None, Vec::new()),
            RawRow::Row {
                key,
                value,
                alt_values,
            } => (key, value, alt_values),
        };

        let key = key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| KeyboardError::validation("table row key is required"))?;
        let value = value.unwrap_or_else(|| key.clone());

        Ok(Self {
            key,
            value,
            alt_values,
        })
    }
}

/// Declarative table as found in layout data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    /// Table type (e.g. "morse-code", "characters")
    #[serde(default, rename = "type")]
    pub table_type: Option<String>,
    /// Table name (e.g. "itu", "en")
    #[serde(default)]
    pub name: Option<String>,
    /// Optional display title
    #[serde(default)]
    pub title: Option<String>,
    /// Rows; older data files call this field `values`
    #[serde(default, alias = "values")]
    pub rows: Vec<RawRow>,
}

impl RawTable {
    /// Creates a raw table from a type, a name and rows.
    pub fn new<I, R>(table_type: &str, name: &str, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RawRow>,
    {
        Self {
            table_type: Some(table_type.to_string()),
            name: Some(name.to_string()),
            title: None,
            rows: rows.into_iter().map(Into::into).collect(),
        }
    }
}

/// A typed, named collection of rows.
///
/// # Validation
///
/// - `type` and `name` must be non-empty
/// - row keys must be unique within the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    /// Table type
    #[serde(rename = "type")]
    pub table_type: String,
    /// Table name
    pub name: String,
    /// Optional display title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    rows: Vec<TableRow>,
}

impl Table {
    /// Creates an empty table.
    pub fn new(table_type: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let table_type = table_type.into();
        let name = name.into();

        if name.is_empty() {
            return Err(KeyboardError::validation("table.name is required").into());
        }
        if table_type.is_empty() {
            return Err(
                KeyboardError::validation(format!("table '{name}': table.type is required"))
                    .into(),
            );
        }
        if table_type.contains('/') || name.contains('/') {
            return Err(KeyboardError::validation(format!(
                "table '{table_type}/{name}': type and name must not contain '/'"
            ))
            .into());
        }

        Ok(Self {
            table_type,
            name,
            title: None,
            rows: Vec::new(),
        })
    }

    /// Builds a table from its declarative form.
    pub fn from_raw(raw: RawTable) -> Result<Self> {
        let mut table = Self::new(
            raw.table_type.unwrap_or_default(),
            raw.name.unwrap_or_default(),
        )?;
        table.title = raw.title;
        for row in raw.rows {
            table.push(row)?;
        }
        Ok(table)
    }

    /// Canonical `type/name` reference.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.table_type, self.name)
    }

    /// Appends a row, normalizing bare keys.
    pub fn push(&mut self, row: impl Into<RawRow>) -> Result<()> {
        let row = TableRow::try_from(row.into())?;
        if self.find_row(&row.key).is_some() {
            return Err(KeyboardError::validation(format!(
                "table '{}': duplicate row key '{}'",
                self.full_name(),
                row.key
            ))
            .into());
        }
        self.rows.push(row);
        Ok(())
    }

    /// Removes every row.
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// All rows in declaration order.
    #[must_use]
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Finds a row by key.
    #[must_use]
    pub fn find_row(&self, key: &str) -> Option<&TableRow> {
        self.rows.iter().find(|r| r.key == key)
    }

    /// Returns true if the table is identified by `reference`.
    #[must_use]
    pub fn matches(&self, reference: &TableRef) -> bool {
        let (table_type, name) = reference.parts();
        table_type.map_or(true, |t| t == self.table_type) && name == self.name
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reference to a table: `"type/name"`, `"name"` or `{ type?, name }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableRef {
    /// `"type/name"` or `"name"`
    FullName(String),
    /// `{ type?, name }`
    Named {
        /// Table type; a `type/` prefix inside `name` takes precedence
        #[serde(default, rename = "type")]
        table_type: Option<String>,
        /// Table name
        name: String,
    },
}

impl TableRef {
    /// Splits the reference into `(type, name)`.
    #[must_use]
    pub fn parts(&self) -> (Option<&str>, &str) {
        match self {
            Self::FullName(full) => split_full_name(full),
            Self::Named { table_type, name } => match split_full_name(name) {
                (Some(t), n) => (Some(t), n),
                (None, n) => (table_type.as_deref(), n),
            },
        }
    }
}

/// Text after a second `/` is dropped: `"a/b/c"` refers to `a/b`.
fn split_full_name(full: &str) -> (Option<&str>, &str) {
    match full.split_once('/') {
        Some((table_type, rest)) => {
            let name = rest.split_once('/').map_or(rest, |(name, _)| name);
            (Some(table_type), name)
        }
        None => (None, full),
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parts() {
            (Some(t), n) => write!(f, "{t}/{n}"),
            (None, n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for TableRef {
    fn from(full: &str) -> Self {
        Self::FullName(full.to_string())
    }
}

impl From<&Table> for TableRef {
    fn from(table: &Table) -> Self {
        Self::Named {
            table_type: Some(table.table_type.clone()),
            name: table.name.clone(),
        }
    }
}

/// Query accepted by [`TableStore::find`] and [`TableStore::filter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableQuery {
    /// A single reference
    One(TableRef),
    /// References evaluated in order
    Many(Vec<TableRef>),
}

impl TableQuery {
    fn refs(&self) -> &[TableRef] {
        match self {
            Self::One(r) => std::slice::from_ref(r),
            Self::Many(refs) => refs,
        }
    }
}

impl From<&str> for TableQuery {
    fn from(full: &str) -> Self {
        Self::One(full.into())
    }
}

impl From<TableRef> for TableQuery {
    fn from(r: TableRef) -> Self {
        Self::One(r)
    }
}

impl From<&TableRef> for TableQuery {
    fn from(r: &TableRef) -> Self {
        Self::One(r.clone())
    }
}

impl From<Vec<TableRef>> for TableQuery {
    fn from(refs: Vec<TableRef>) -> Self {
        Self::Many(refs)
    }
}

impl From<&[&str]> for TableQuery {
    fn from(refs: &[&str]) -> Self {
        Self::Many(refs.iter().map(|r| TableRef::from(*r)).collect())
    }
}

/// Ordered collection of tables, unique by `(type, name)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableStore {
    tables: Vec<Table>,
}

impl TableStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from declarative tables.
    pub fn from_raw(raw: Vec<RawTable>) -> Result<Self> {
        let mut store = Self::new();
        for table in raw {
            store.push(Table::from_raw(table)?)?;
        }
        Ok(store)
    }

    /// Appends a table; its identity must not already be present.
    pub fn push(&mut self, table: Table) -> Result<()> {
        if self.contains(&table) {
            return Err(KeyboardError::validation(format!(
                "duplicate table '{}'",
                table.full_name()
            ))
            .into());
        }
        self.tables.push(table);
        Ok(())
    }

    /// Appends the tables whose identity is not yet present.
    ///
    /// Returns the number of tables added.
    pub fn extend_missing<'a, I>(&mut self, tables: I) -> usize
    where
        I: IntoIterator<Item = &'a Table>,
    {
        let mut added = 0;
        for table in tables {
            if self.contains(table) {
                tracing::debug!(
                    table = %table.full_name(),
                    "Table already defined by layout; keeping layout copy"
                );
                continue;
            }
            self.tables.push(table.clone());
            added += 1;
        }
        added
    }

    /// Removes every table.
    pub fn clear(&mut self) {
        self.tables.clear();
    }

    fn contains(&self, table: &Table) -> bool {
        self.tables
            .iter()
            .any(|t| t.table_type == table.table_type && t.name == table.name)
    }

    /// Finds the first table matching the query; list queries are tried in order.
    pub fn find(&self, query: impl Into<TableQuery>) -> Option<&Table> {
        query
            .into()
            .refs()
            .iter()
            .find_map(|r| self.tables.iter().find(|t| t.matches(r)))
    }

    /// Returns every table matching the query, in query then store order.
    pub fn filter(&self, query: impl Into<TableQuery>) -> Vec<&Table> {
        query
            .into()
            .refs()
            .iter()
            .flat_map(|r| self.tables.iter().filter(move |t| t.matches(r)))
            .collect()
    }

    /// Merges the rows of the given tables; earlier tables mask later ones.
    #[must_use]
    pub fn merge(tables: &[&Table]) -> Vec<TableRow> {
        let mut merged: Vec<TableRow> = Vec::new();
        for table in tables {
            for row in table.rows() {
                if !merged.iter().any(|m| m.key == row.key) {
                    merged.push(row.clone());
                }
            }
        }
        merged
    }

    /// Iterates over the tables in order.
    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    /// Number of tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::kind_of;

    fn morse_store() -> TableStore {
        TableStore::from_raw(vec![
            RawTable::new("morse-code", "itu", [("a", ".-"), ("b", "-...")]),
            RawTable::new("morse-code", "uk-legal", [("a", ".-.."), ("c", "-.-.")]),
            RawTable::new("characters", "en", ["a", "b", "c"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_row_value_defaults_to_key() {
        let row = TableRow::try_from(RawRow::from("a")).unwrap();
        assert_eq!(row.key, "a");
        assert_eq!(row.value, "a");
        assert!(row.alt_values.is_empty());
    }

    #[test]
    fn test_row_without_key_is_rejected() {
        let raw = RawRow::Row {
            key: None,
            value: Some("x".to_string()),
            alt_values: Vec::new(),
        };
        assert!(TableRow::try_from(raw).unwrap_err().is_validation());
    }

    #[test]
    fn test_row_values_order() {
        let row = TableRow::new("n", "November").with_alt_values(["Nov"]);
        let values: Vec<&str> = row.values().collect();
        assert_eq!(values, vec!["November", "Nov"]);
    }

    #[test]
    fn test_table_requires_type_and_name() {
        let err = Table::new("", "itu").unwrap_err();
        assert!(kind_of(&err).is_some_and(KeyboardError::is_validation));
        let err = Table::new("morse-code", "").unwrap_err();
        assert!(kind_of(&err).is_some_and(KeyboardError::is_validation));
    }

    #[test]
    fn test_table_rejects_duplicate_keys() {
        let mut table = Table::new("characters", "en").unwrap();
        table.push("a").unwrap();
        assert!(table.push(("a", "A")).is_err());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_raw_table_accepts_values_alias() {
        let raw: RawTable = serde_json::from_str(
            r#"{"type":"morse-code","name":"itu","values":["e",{"key":"a","value":".-"}]}"#,
        )
        .unwrap();
        let table = Table::from_raw(raw).unwrap();
        assert_eq!(table.find_row("a").unwrap().value, ".-");
        assert_eq!(table.find_row("e").unwrap().value, "e");
    }

    #[test]
    fn test_find_by_full_name_and_bare_name() {
        let store = morse_store();
        let by_full = store.find("characters/en").unwrap();
        let by_name = store.find("en").unwrap();
        assert_eq!(by_full, by_name);
    }

    #[test]
    fn test_find_by_object_reference() {
        let store = morse_store();
        let reference: TableRef =
            serde_json::from_str(r#"{"type":"morse-code","name":"uk-legal"}"#).unwrap();
        assert_eq!(store.find(reference).unwrap().name, "uk-legal");

        let prefixed = TableRef::Named {
            table_type: Some("ignored".to_string()),
            name: "morse-code/itu".to_string(),
        };
        assert_eq!(store.find(prefixed).unwrap().name, "itu");
    }

    #[test]
    fn test_find_list_first_match_wins() {
        let store = morse_store();
        let query: &[&str] = &["missing", "morse-code/uk-legal", "morse-code/itu"];
        assert_eq!(store.find(query).unwrap().name, "uk-legal");
        assert!(store.find("characters/itu").is_none());
    }

    #[test]
    fn test_filter_preserves_duplicates() {
        let store = morse_store();
        let query: &[&str] = &["itu", "morse-code/itu"];
        let found = store.filter(query);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|t| t.name == "itu"));
    }

    #[test]
    fn test_merge_earlier_table_wins() {
        let store = morse_store();
        let tables = store.filter(vec![
            TableRef::from("morse-code/uk-legal"),
            TableRef::from("morse-code/itu"),
        ]);
        let merged = TableStore::merge(&tables);

        assert_eq!(merged.len(), 3);
        let a = merged.iter().find(|r| r.key == "a").unwrap();
        assert_eq!(a.value, ".-..");
        let keys: Vec<&str> = merged.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_store_rejects_duplicate_identity() {
        let mut store = morse_store();
        let dup = Table::new("morse-code", "itu").unwrap();
        assert!(store.push(dup).is_err());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_extend_missing_keeps_existing() {
        let mut store = morse_store();
        let mut replacement = Table::new("morse-code", "itu").unwrap();
        replacement.push(("a", "X")).unwrap();
        let extra = Table::new("phonetic-alphabet", "nato").unwrap();

        let added = store.extend_missing([&replacement, &extra]);
        assert_eq!(added, 1);
        assert_eq!(store.find("morse-code/itu").unwrap().find_row("a").unwrap().value, ".-");
        assert!(store.find("phonetic-alphabet/nato").is_some());
    }

    #[test]
    fn test_table_ref_display() {
        assert_eq!(TableRef::from("morse-code/itu").to_string(), "morse-code/itu");
        assert_eq!(TableRef::from("itu").to_string(), "itu");
    }

    #[test]
    fn test_extra_path_segments_are_dropped() {
        let store = morse_store();
        let reference = TableRef::from("morse-code/itu/extra");
        assert_eq!(reference.parts(), (Some("morse-code"), "itu"));
        assert_eq!(store.find(reference).unwrap().name, "itu");
    }

    #[test]
    fn test_table_name_with_slash_is_rejected() {
        let err = Table::new("morse-code", "itu/old").unwrap_err();
        assert!(kind_of(&err).is_some_and(KeyboardError::is_validation));
        assert!(Table::new("a/b", "c").is_err());
    }
}
