//! Label resolution engine.
//!
//! Derives, for every key, one label list per slot by cross-referencing the
//! layout's tables:
//!
//! 1. Explicit labels on the key record win and are left untouched.
//! 2. The key's *code rows* are looked up in the effective code table (the
//!    slot's `codeTable`, else the layout code table).
//! 3. If the slot is bound to a table of the same type as the code table but
//!    with a different name, labels are cross-referenced through the shared
//!    row key, skipping values identical to the code table's own value.
//! 4. Otherwise labels are read directly from the slot's label rows, matching
//!    the code rows' keys or the key's own identifiers.
//!
//! Derived strings go through the slot's case transform.

use crate::models::{KeyRecord, Layout, Table, TableRow};
use crate::services::bindings::{bind_slots, SlotBinding};
use anyhow::Result;

/// Labels derived for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLabels {
    /// Explicit code, else the value of the first code row
    pub code: Option<String>,
    /// One list per slot, in slot declaration order
    pub labels: Vec<Vec<String>>,
}

/// Resolves labels for the keys of one layout.
#[derive(Debug)]
pub struct LabelResolver<'a> {
    bindings: Vec<SlotBinding<'a>>,
    code_table: Option<&'a Table>,
}

impl<'a> LabelResolver<'a> {
    /// Binds the layout's label slots and selects the layout code table.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error if a slot references an unknown table.
    pub fn new(layout: &'a Layout) -> Result<Self> {
        let bindings = bind_slots(layout)?;
        let code_table = layout_code_table(&bindings);

        tracing::debug!(
            layout = %layout.name,
            slots = bindings.len(),
            code_table = ?code_table.map(Table::full_name),
            "Label resolver ready"
        );

        Ok(Self {
            bindings,
            code_table,
        })
    }

    /// The layout-wide code table, if any slot provides one.
    #[must_use]
    pub fn code_table(&self) -> Option<&'a Table> {
        self.code_table
    }

    /// Slot bindings in declaration order.
    #[must_use]
    pub fn bindings(&self) -> &[SlotBinding<'a>] {
        &self.bindings
    }

    /// Derives the labels of one key. Does not modify the record, so calling
    /// it repeatedly yields the same result.
    #[must_use]
    pub fn resolve(&self, key: &KeyRecord) -> KeyLabels {
        let code = key.code.clone().or_else(|| {
            self.code_table
                .and_then(|table| code_rows(table, key).first().map(|row| row.value.clone()))
        });

        let labels = self
            .bindings
            .iter()
            .map(|binding| match key.explicit_label(binding.index) {
                Some(explicit) => explicit.to_values(),
                None => self.derive(binding, key),
            })
            .collect();

        KeyLabels { code, labels }
    }

    fn derive(&self, binding: &SlotBinding<'a>, key: &KeyRecord) -> Vec<String> {
        let code_table = binding.code_table.or(self.code_table);
        let matched = code_table.map(|t| code_rows(t, key)).unwrap_or_default();
        let slot = binding.slot;

        if let (Some(code_table), Some(bound)) = (code_table, binding.bound_table()) {
            if !matched.is_empty() && is_cross_reference(code_table, bound) {
                return matched
                    .iter()
                    .flat_map(|code_row| {
                        bound
                            .rows()
                            .iter()
                            .filter(move |row| row.key == code_row.key && row.value != code_row.value)
                    })
                    .flat_map(TableRow::values)
                    .map(|value| slot.transform(value))
                    .collect();
            }
        }

        let match_keys: Vec<&str> = if matched.is_empty() {
            key.key.aliases().iter().map(String::as_str).collect()
        } else {
            matched.iter().map(|row| row.key.as_str()).collect()
        };

        binding
            .label_rows()
            .iter()
            .filter(|row| match_keys.contains(&row.key.as_str()))
            .flat_map(TableRow::values)
            .map(|value| slot.transform(value))
            .collect()
    }
}

/// Same type, different name: the only combination treated as a
/// cross-reference.
fn is_cross_reference(code_table: &Table, bound: &Table) -> bool {
    bound.table_type == code_table.table_type && bound.name != code_table.name
}

/// Rows of `table` identifying `key`: rows keyed by one of its identifiers,
/// else rows whose value equals its explicit code.
fn code_rows<'t>(table: &'t Table, key: &KeyRecord) -> Vec<&'t TableRow> {
    let rows: Vec<&TableRow> = table.rows().iter().filter(|row| key.key.matches(&row.key)).collect();
    if !rows.is_empty() {
        return rows;
    }
    key.code.as_deref().map_or_else(Vec::new, |code| {
        table.rows().iter().filter(|row| row.value == code).collect()
    })
}

/// The main slot's `codeTable`, else its `valueTable`, else the first slot
/// `codeTable`, else the first slot `valueTable`.
fn layout_code_table<'a>(bindings: &[SlotBinding<'a>]) -> Option<&'a Table> {
    let main = bindings.iter().find(|b| b.slot.is_main);

    main.and_then(|b| b.code_table.or(b.value_table))
        .or_else(|| bindings.iter().find_map(|b| b.code_table))
        .or_else(|| bindings.iter().find_map(|b| b.value_table))
}
