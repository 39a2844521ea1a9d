//! Data models for tables, label slots, keys and layouts.
//!
//! Models are independent of rendering and input handling. Each has a
//! declarative `Raw*` form for deserialization and a normalized form that is
//! validated on construction.

pub mod key;
pub mod label;
pub mod layout;
pub mod table;

// Re-export all model types
pub use key::{normalize_keys, ExplicitLabel, KeyId, KeyRecord, RawKey, RawKeyRecord, RawRowKey};
pub use label::{assign_positions, LabelCase, LabelDirection, LabelSlot, LabelTableRef, RawLabelSlot};
pub use layout::{ColumnLimit, Layout, RawLayout, RowLimit};
pub use table::{RawRow, RawTable, Table, TableQuery, TableRef, TableRow, TableStore};
