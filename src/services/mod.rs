//! Service layer for layout resolution.
//!
//! Services derive everything a renderer needs from an immutable
//! [`Layout`](crate::models::Layout): table bindings, per-slot labels and the
//! key grid.

pub mod bindings;
pub mod labels;
pub mod placement;
pub mod resolve;

// Re-export commonly used types and functions
pub use bindings::{bind_slots, SlotBinding};
pub use labels::{KeyLabels, LabelResolver};
pub use placement::{place_keys, Grid, GridColumn, GridRow, Placement};
pub use resolve::{resolve_layout, ResolvedKey, ResolvedLayout};
