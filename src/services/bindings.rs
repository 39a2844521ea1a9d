//! Resolution of label-slot table references.
//!
//! Binds every `valueTable`, `labelTable` and `codeTable` of a layout's label
//! slots to tables in the layout's store. Multi-table `labelTable` bindings
//! are merged once here and cached on the binding.

use crate::error::KeyboardError;
use crate::models::{LabelSlot, LabelTableRef, Layout, Table, TableRef, TableRow, TableStore};
use anyhow::Result;

/// A label slot with its table references resolved.
#[derive(Debug, Clone)]
pub struct SlotBinding<'a> {
    /// Declaration index of the slot
    pub index: usize,
    /// The slot definition
    pub slot: &'a LabelSlot,
    /// Resolved `valueTable`
    pub value_table: Option<&'a Table>,
    /// Resolved `labelTable` entries in declaration order
    pub label_tables: Vec<&'a Table>,
    /// Resolved `codeTable`
    pub code_table: Option<&'a Table>,
    merged_labels: Option<Vec<TableRow>>,
}

impl<'a> SlotBinding<'a> {
    /// The table this slot is bound to for cross-referencing: its
    /// `valueTable`, else its first `labelTable`.
    #[must_use]
    pub fn bound_table(&self) -> Option<&'a Table> {
        self.value_table.or_else(|| self.label_tables.first().copied())
    }

    /// Rows labels are read from in the direct case: the merged or single
    /// `labelTable`, else the `valueTable`.
    #[must_use]
    pub fn label_rows(&self) -> &[TableRow] {
        if let Some(merged) = &self.merged_labels {
            return merged;
        }
        self.label_tables
            .first()
            .or(self.value_table.as_ref())
            .map(|t| t.rows())
            .unwrap_or(&[])
    }
}

/// Resolves the bindings of every label slot, in declaration order.
///
/// # Errors
///
/// Returns [`KeyboardError::Configuration`] naming the slot and field of the
/// first reference that is not in the layout's table store.
pub fn bind_slots(layout: &Layout) -> Result<Vec<SlotBinding<'_>>> {
    let store = &layout.tables;

    layout
        .labels
        .iter()
        .enumerate()
        .map(|(index, slot)| bind_slot(store, index, slot))
        .collect()
}

fn bind_slot<'a>(store: &'a TableStore, index: usize, slot: &'a LabelSlot) -> Result<SlotBinding<'a>> {
    let value_table = slot
        .value_table
        .as_ref()
        .map(|r| lookup(store, index, "valueTable", r))
        .transpose()?;

    let code_table = slot
        .code_table
        .as_ref()
        .map(|r| lookup(store, index, "codeTable", r))
        .transpose()?;

    let (label_tables, merged_labels) = match &slot.label_table {
        None => (Vec::new(), None),
        Some(label_table) => {
            let refs = label_table.refs();
            let many = matches!(label_table, LabelTableRef::Many(_));
            let tables = refs
                .iter()
                .enumerate()
                .map(|(i, r)| {
                    let field = if many {
                        format!("labelTable[{i}]")
                    } else {
                        "labelTable".to_string()
                    };
                    lookup(store, index, &field, r)
                })
                .collect::<Result<Vec<_>>>()?;
            let merged = many.then(|| TableStore::merge(&tables));
            (tables, merged)
        }
    };

    tracing::debug!(
        slot = index,
        position = slot.position,
        value_table = ?value_table.map(Table::full_name),
        label_tables = label_tables.len(),
        code_table = ?code_table.map(Table::full_name),
        "Bound label slot"
    );

    Ok(SlotBinding {
        index,
        slot,
        value_table,
        label_tables,
        code_table,
        merged_labels,
    })
}

fn lookup<'a>(store: &'a TableStore, slot: usize, field: &str, reference: &TableRef) -> Result<&'a Table> {
    store
        .find(reference)
        .ok_or_else(|| KeyboardError::configuration(slot, field, reference.to_string()).into())
}
