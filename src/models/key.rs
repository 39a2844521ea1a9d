//! Key records and key-list normalization.

use crate::error::KeyboardError;
use anyhow::Result;
use serde::de::value::MapAccessDeserializer;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier of a key: a single name or a list of aliases.
///
/// Aliases let one on-screen key answer to several physical key names, e.g.
/// locale variants of the same character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyId {
    /// Single identifier
    Single(String),
    /// Alias list
    Aliases(Vec<String>),
}

impl KeyId {
    /// All identifiers in declaration order.
    #[must_use]
    pub fn aliases(&self) -> &[String] {
        match self {
            Self::Single(id) => std::slice::from_ref(id),
            Self::Aliases(ids) => ids,
        }
    }

    /// Returns true if `id` is one of the identifiers.
    #[must_use]
    pub fn matches(&self, id: &str) -> bool {
        self.aliases().iter().any(|a| a == id)
    }

    /// Case-insensitive match, used for physical keystrokes.
    #[must_use]
    pub fn matches_keystroke(&self, id: &str) -> bool {
        let id = id.to_lowercase();
        self.aliases().iter().any(|a| a.to_lowercase() == id)
    }

    /// Region identifier on the rendering surface (aliases joined by `,`).
    #[must_use]
    pub fn region_id(&self) -> String {
        self.aliases().join(",")
    }

    fn is_blank(&self) -> bool {
        self.aliases().iter().all(String::is_empty)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.region_id())
    }
}

impl From<&str> for KeyId {
    fn from(id: &str) -> Self {
        Self::Single(id.to_string())
    }
}

/// Label supplied explicitly by a key record for one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExplicitLabel {
    /// A single string
    One(String),
    /// A list of strings
    Many(Vec<String>),
}

impl ExplicitLabel {
    /// Normalizes to a list, wrapping a bare string.
    #[must_use]
    pub fn to_values(&self) -> Vec<String> {
        match self {
            Self::One(s) => vec![s.clone()],
            Self::Many(v) => v.clone(),
        }
    }
}

/// A normalized key record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRecord {
    /// Identifier or aliases
    pub key: KeyId,
    /// Explicit grid row
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    /// Explicit grid column within the row
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    /// Explicit code; otherwise derived from the code table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Explicit labels by slot index; `None` means "derive"
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Option<ExplicitLabel>>,
    /// Disabled keys ignore activation
    pub disabled: bool,
    /// Highlighted keys are emphasized by the renderer
    pub hilighted: bool,
}

impl KeyRecord {
    /// Creates a record with only an identifier.
    pub fn new(key: impl Into<KeyId>) -> Self {
        Self {
            key: key.into(),
            row: None,
            column: None,
            code: None,
            labels: Vec::new(),
            disabled: false,
            hilighted: false,
        }
    }

    /// Sets the explicit row.
    #[must_use]
    pub const fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    /// Sets the explicit column.
    #[must_use]
    pub const fn with_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }

    /// Explicit label for a slot, if one was supplied.
    #[must_use]
    pub fn explicit_label(&self, slot: usize) -> Option<&ExplicitLabel> {
        self.labels.get(slot).and_then(Option::as_ref)
    }
}

/// Declarative key record; every field is optional so that a missing `key`
/// surfaces as a validation error instead of a parse error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawKeyRecord {
    /// Identifier or aliases
    #[serde(default)]
    pub key: Option<KeyId>,
    /// Explicit row
    #[serde(default)]
    pub row: Option<usize>,
    /// Explicit column
    #[serde(default)]
    pub column: Option<usize>,
    /// Explicit code
    #[serde(default)]
    pub code: Option<String>,
    /// Explicit labels by slot index
    #[serde(default)]
    pub labels: Vec<Option<ExplicitLabel>>,
    /// Disabled flag
    #[serde(default)]
    pub disabled: bool,
    /// Highlight flag
    #[serde(default)]
    pub hilighted: bool,
}

impl TryFrom<RawKeyRecord> for KeyRecord {
    type Error = KeyboardError;

    fn try_from(raw: RawKeyRecord) -> std::result::Result<Self, Self::Error> {
        let key = raw
            .key
            .filter(|k| !k.is_blank())
            .ok_or_else(|| KeyboardError::validation("key.key is required"))?;

        Ok(Self {
            key,
            row: raw.row,
            column: raw.column,
            code: raw.code,
            labels: raw.labels,
            disabled: raw.disabled,
            hilighted: raw.hilighted,
        })
    }
}

impl From<KeyRecord> for RawKeyRecord {
    fn from(record: KeyRecord) -> Self {
        Self {
            key: Some(record.key),
            row: record.row,
            column: record.column,
            code: record.code,
            labels: record.labels,
            disabled: record.disabled,
            hilighted: record.hilighted,
        }
    }
}

/// An entry of a layout's `keys` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawKey {
    /// Bare identifier
    Id(String),
    /// A full grid row
    Row(Vec<RawRowKey>),
    /// Structured record
    #[serde(deserialize_with = "record_from_map")]
    Record(RawKeyRecord),
}

/// An entry of a row array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawRowKey {
    /// Bare identifier
    Id(String),
    /// Alias list for a single key
    Aliases(Vec<String>),
    /// Structured record; an explicit `row` overrides the array's row
    #[serde(deserialize_with = "record_from_map")]
    Record(RawKeyRecord),
}

/// Records are only accepted in object form, so an array inside a row is
/// always read as an alias list.
fn record_from_map<'de, D>(deserializer: D) -> std::result::Result<RawKeyRecord, D::Error>
where
    D: Deserializer<'de>,
{
    struct RecordVisitor;

    impl<'de> Visitor<'de> for RecordVisitor {
        type Value = RawKeyRecord;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a key record object")
        }

        fn visit_map<A>(self, map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            RawKeyRecord::deserialize(MapAccessDeserializer::new(map))
        }
    }

    deserializer.deserialize_map(RecordVisitor)
}

impl From<&str> for RawKey {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

impl From<&[&str]> for RawKey {
    fn from(row: &[&str]) -> Self {
        Self::Row(row.iter().map(|s| RawRowKey::Id((*s).to_string())).collect())
    }
}

impl From<KeyRecord> for RawKey {
    fn from(record: KeyRecord) -> Self {
        Self::Record(record.into())
    }
}

/// Expands a raw key list into records, preserving order.
///
/// Each row array becomes one grid row: its keys are tagged with the current
/// row counter, which then advances. Bare identifiers that follow a row array
/// inherit the current counter; structured records are kept as written.
pub fn normalize_keys(raw: Vec<RawKey>) -> Result<Vec<KeyRecord>> {
    let mut keys = Vec::with_capacity(raw.len());
    let mut row = 0;
    let mut seen_row = false;

    for (idx, entry) in raw.into_iter().enumerate() {
        match entry {
            RawKey::Id(id) => {
                if id.is_empty() {
                    return Err(KeyboardError::validation(format!(
                        "keys[{idx}]: key identifier is empty"
                    ))
                    .into());
                }
                let mut record = KeyRecord::new(KeyId::Single(id));
                if seen_row {
                    record.row = Some(row);
                }
                keys.push(record);
            }
            RawKey::Row(entries) => {
                for entry in entries {
                    let record = match entry {
                        RawRowKey::Id(id) if id.is_empty() => {
                            return Err(KeyboardError::validation(format!(
                                "keys[{idx}]: row contains an empty key identifier"
                            ))
                            .into());
                        }
                        RawRowKey::Id(id) => KeyRecord::new(KeyId::Single(id)),
                        RawRowKey::Aliases(ids) => record_at(
                            idx,
                            RawKeyRecord {
                                key: Some(KeyId::Aliases(ids)),
                                ..RawKeyRecord::default()
                            },
                        )?,
                        RawRowKey::Record(record) => record_at(idx, record)?,
                    };
                    let explicit = record.row;
                    keys.push(KeyRecord {
                        row: explicit.or(Some(row)),
                        ..record
                    });
                }
                row += 1;
                seen_row = true;
            }
            RawKey::Record(record) => keys.push(record_at(idx, record)?),
        }
    }

    Ok(keys)
}

fn record_at(idx: usize, raw: RawKeyRecord) -> std::result::Result<KeyRecord, KeyboardError> {
    KeyRecord::try_from(raw).map_err(|e| match e {
        KeyboardError::Validation { message } => {
            KeyboardError::validation(format!("keys[{idx}]: {message}"))
        }
        other => other,
    })
}
